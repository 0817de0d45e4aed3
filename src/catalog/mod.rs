//! Catalog domain: record types, wire types and the remote API client.

pub mod api_types;
pub mod client;
pub mod images;
pub mod seed;
pub mod types;

pub use client::{CatalogApi, HttpCatalogClient, UploadTarget};
pub use images::ImageUpload;
pub use types::{Category, CategoryDraft, Product, ProductDraft};

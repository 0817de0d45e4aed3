//! Cached catalog reads.
//!
//! `QueryClient` keeps the result of each catalog read under a `CatalogKey`
//! until it goes stale or a write invalidates it. `CachedCatalog` wires a
//! client in front of a `SyncStore`.

mod cached;
mod client;
mod keys;

pub use cached::CachedCatalog;
pub use client::{QueryClient, DEFAULT_STALE_TIME};
pub use keys::CatalogKey;

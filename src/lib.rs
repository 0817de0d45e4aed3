//! Offline-tolerant data layer for a storefront catalog.
//!
//! `SyncStore` talks to the remote catalog REST API and falls back to a
//! durable local overlay when the API can't be reached. `CachedCatalog` adds
//! a query cache on top, `view` derives the shop listing, and `health`
//! probes connectivity.

pub mod catalog;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod query;
pub mod storage;
pub mod sync;
pub mod view;

pub use catalog::{CatalogApi, Category, CategoryDraft, HttpCatalogClient, Product, ProductDraft};
pub use config::Config;
pub use error::{RemoteError, SyncError, SyncResult};
pub use health::{HealthService, HealthStatus};
pub use query::{CachedCatalog, CatalogKey, QueryClient};
pub use storage::{LocalStore, MemoryStorage, SqliteStorage};
pub use sync::{SyncStore, WriteOrigin};
pub use view::CatalogView;

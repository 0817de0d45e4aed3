//! Durable string-keyed storage for state that must survive restarts.
//!
//! The sync layer keeps two values here: the JSON-serialized local product
//! overlay and the last API health check. Backends:
//! - `SqliteStorage`: a key/value table in a SQLite file (default)
//! - `MemoryStorage`: process-local map, used when persistence is disabled

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use traits::LocalStore;

/// Key holding the JSON array of locally created or edited products.
pub const LOCAL_PRODUCTS_KEY: &str = "localProducts";

/// Key holding the most recent health check result.
pub const HEALTH_STATUS_KEY: &str = "apiHealthStatus";

//! In-process cache of query results with invalidation hooks.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

use super::keys::CatalogKey;

/// Default time before a cached result is refetched
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

struct Entry {
  key: CatalogKey,
  value: Arc<dyn Any + Send + Sync>,
  fetched_at: Instant,
  invalidated: bool,
}

/// Keyed cache of query results.
///
/// A result is served from the cache until it goes stale or a mutation
/// invalidates it; the next fetch then runs the fetcher again. Cloning is
/// cheap and clones share entries.
#[derive(Clone)]
pub struct QueryClient {
  entries: Arc<Mutex<HashMap<String, Entry>>>,
  stale_time: Duration,
}

impl Default for QueryClient {
  fn default() -> Self {
    Self::new()
  }
}

impl QueryClient {
  pub fn new() -> Self {
    Self {
      entries: Arc::new(Mutex::new(HashMap::new())),
      stale_time: DEFAULT_STALE_TIME,
    }
  }

  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  /// Return the cached value for `key` while fresh, otherwise run `fetcher`
  /// and cache what it returns. Errors are not cached.
  pub async fn fetch<T, E, F, Fut>(&self, key: &CatalogKey, fetcher: F) -> Result<T, E>
  where
    T: Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let hash = key.cache_hash();
    if let Some(value) = self.fresh::<T>(&hash) {
      debug!(query = %key.description(), "query cache hit");
      return Ok(value);
    }

    debug!(query = %key.description(), "query cache miss, fetching");
    let value = fetcher().await?;
    self.entries().insert(
      hash,
      Entry {
        key: key.clone(),
        value: Arc::new(value.clone()),
        fetched_at: Instant::now(),
        invalidated: false,
      },
    );
    Ok(value)
  }

  /// Cached value for `key`, stale or not.
  pub fn peek<T: Clone + 'static>(&self, key: &CatalogKey) -> Option<T> {
    self
      .entries()
      .get(&key.cache_hash())
      .and_then(|entry| entry.value.downcast_ref::<T>().cloned())
  }

  /// Whether `key` has an entry that would be served without fetching.
  pub fn is_fresh(&self, key: &CatalogKey) -> bool {
    self
      .entries()
      .get(&key.cache_hash())
      .is_some_and(|entry| self.entry_is_fresh(entry))
  }

  /// Mark every entry whose key matches `predicate` for refetch. Returns
  /// how many entries were marked.
  pub fn invalidate_where(&self, predicate: impl Fn(&CatalogKey) -> bool) -> usize {
    let mut count = 0;
    for entry in self.entries().values_mut() {
      if predicate(&entry.key) && !entry.invalidated {
        entry.invalidated = true;
        count += 1;
      }
    }
    if count > 0 {
      debug!(count, "invalidated cached queries");
    }
    count
  }

  pub fn invalidate(&self, key: &CatalogKey) -> usize {
    self.invalidate_where(|k| k == key)
  }

  pub fn remove(&self, key: &CatalogKey) {
    self.entries().remove(&key.cache_hash());
  }

  pub fn clear(&self) {
    self.entries().clear();
  }

  // Mutation hooks

  pub fn product_created(&self) {
    self.invalidate_where(CatalogKey::is_product_list);
  }

  pub fn product_updated(&self, id: i64) {
    self.invalidate_where(|k| k.is_product_list() || *k == CatalogKey::ProductDetail(id));
  }

  pub fn product_deleted(&self, id: i64) {
    self.invalidate_where(CatalogKey::is_product_list);
    self.remove(&CatalogKey::ProductDetail(id));
  }

  pub fn purchase_recorded(&self, id: i64) {
    self.invalidate_where(|k| {
      k.is_product_list() || *k == CatalogKey::ProductDetail(id) || *k == CatalogKey::MostRequested
    });
  }

  pub fn category_created(&self) {
    self.invalidate(&CatalogKey::CategoryList);
  }

  pub fn category_updated(&self, id: i64) {
    self.invalidate_where(|k| {
      *k == CatalogKey::CategoryList || *k == CatalogKey::CategoryDetail(id)
    });
  }

  pub fn category_deleted(&self, id: i64) {
    self.invalidate(&CatalogKey::CategoryList);
    self.remove(&CatalogKey::CategoryDetail(id));
  }

  fn fresh<T: Clone + 'static>(&self, hash: &str) -> Option<T> {
    let entries = self.entries();
    let entry = entries.get(hash)?;
    if !self.entry_is_fresh(entry) {
      return None;
    }
    entry.value.downcast_ref::<T>().cloned()
  }

  fn entry_is_fresh(&self, entry: &Entry) -> bool {
    !entry.invalidated && entry.fetched_at.elapsed() <= self.stale_time
  }

  // A panic while holding the lock leaves the map itself intact
  fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
    self
      .entries
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

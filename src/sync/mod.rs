//! Remote-first catalog store with a local fallback.
//!
//! Every operation tries the remote API first. When the call fails, for a
//! transport error or a non-2xx status alike, the store takes the local
//! path instead:
//! - product reads are served from the local overlay
//! - product writes land in the local overlay and are reported as saved
//! - category reads are served from a fixed seed list
//!
//! Nothing is reconciled when the API comes back. A product is owned either
//! by the server or by the overlay.

mod categories;
mod overlay;
mod products;

#[cfg(test)]
pub(crate) mod fake;

pub use overlay::LocalOverlay;

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::catalog::{CatalogApi, Product};
use crate::error::{SyncError, SyncResult};
use crate::storage::LocalStore;

/// Where a write ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrigin {
  Remote,
  Local,
}

/// Catalog store combining the remote API and the local overlay.
///
/// Cloning is cheap; clones share the API client, the local store and the
/// id allocator.
pub struct SyncStore<A: CatalogApi, S: LocalStore> {
  api: Arc<A>,
  store: Arc<S>,
  overlay: LocalOverlay<S>,
  /// Highest server-assigned id seen, kept so local ids stay above it
  max_remote_id: Arc<AtomicI64>,
}

impl<A: CatalogApi, S: LocalStore> SyncStore<A, S> {
  pub fn new(api: A, store: S) -> Self {
    Self::from_shared(Arc::new(api), Arc::new(store))
  }

  pub fn from_shared(api: Arc<A>, store: Arc<S>) -> Self {
    Self {
      overlay: LocalOverlay::new(Arc::clone(&store)),
      api,
      store,
      max_remote_id: Arc::new(AtomicI64::new(0)),
    }
  }

  pub fn api(&self) -> &A {
    &self.api
  }

  pub fn local_store(&self) -> &Arc<S> {
    &self.store
  }

  pub fn overlay(&self) -> &LocalOverlay<S> {
    &self.overlay
  }

  /// Drop every locally held product.
  pub fn clear_local(&self) -> SyncResult<()> {
    self.overlay.clear()?;
    Ok(())
  }

  fn note_remote_ids(&self, products: &[Product]) {
    if let Some(max) = products.iter().map(|p| p.id).max() {
      self.max_remote_id.fetch_max(max, Ordering::SeqCst);
    }
  }
}

impl<A: CatalogApi, S: LocalStore> Clone for SyncStore<A, S> {
  fn clone(&self) -> Self {
    Self {
      api: Arc::clone(&self.api),
      store: Arc::clone(&self.store),
      overlay: self.overlay.clone(),
      max_remote_id: Arc::clone(&self.max_remote_id),
    }
  }
}

/// Pick an id for a new local product.
///
/// The current time in milliseconds, raised if needed so it lands above every
/// id already in the overlay and every server id seen so far. Fails once the
/// id space above the highest known id is exhausted.
fn allocate_local_id(existing: &[Product], max_remote_id: i64) -> SyncResult<i64> {
  let highest = existing
    .iter()
    .map(|p| p.id)
    .fold(max_remote_id, i64::max);

  let next = highest
    .checked_add(1)
    .ok_or_else(|| SyncError::Storage(format!("no local id available above {}", highest)))?;
  Ok(Utc::now().timestamp_millis().max(next))
}

/// Remote records first, then overlay records the server doesn't also have.
fn merge(remote: Vec<Product>, local: Vec<Product>) -> Vec<Product> {
  let remote_ids: std::collections::HashSet<i64> = remote.iter().map(|p| p.id).collect();

  let mut merged = remote;
  for product in local {
    if remote_ids.contains(&product.id) {
      tracing::debug!(id = product.id, "local entry shadowed by remote record");
      continue;
    }
    merged.push(product);
  }
  merged
}

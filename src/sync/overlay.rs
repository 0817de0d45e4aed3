use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tracing::warn;

use crate::catalog::Product;
use crate::storage::{LocalStore, LOCAL_PRODUCTS_KEY};

/// Products written while the API was unreachable.
///
/// Stored as one JSON array under a single key. Entries are never pushed
/// back to the server; they live until edited, deleted or cleared.
pub struct LocalOverlay<S: LocalStore> {
  store: Arc<S>,
}

impl<S: LocalStore> LocalOverlay<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  /// Read the overlay, degrading to an empty list when it can't be read.
  pub fn load(&self) -> Vec<Product> {
    match self.try_load() {
      Ok(products) => products,
      Err(e) => {
        warn!(error = %e, "local overlay unreadable, treating as empty");
        Vec::new()
      }
    }
  }

  pub fn try_load(&self) -> Result<Vec<Product>> {
    decode(self.store.get(LOCAL_PRODUCTS_KEY)?)
  }

  pub fn get(&self, id: i64) -> Option<Product> {
    self.load().into_iter().find(|p| p.id == id)
  }

  /// Apply `f` to the overlay and persist the result in one atomic step.
  ///
  /// A corrupt overlay is reported rather than overwritten.
  pub fn modify<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut Vec<Product>) -> T,
  {
    self.store.update(LOCAL_PRODUCTS_KEY, |raw| {
      let mut products = decode(raw)?;
      let out = f(&mut products);
      let encoded = serde_json::to_string(&products)
        .map_err(|e| eyre!("Failed to serialize local overlay: {}", e))?;
      Ok((Some(encoded), out))
    })
  }

  pub fn clear(&self) -> Result<()> {
    self.store.remove(LOCAL_PRODUCTS_KEY)
  }
}

impl<S: LocalStore> Clone for LocalOverlay<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}

fn decode(raw: Option<String>) -> Result<Vec<Product>> {
  match raw {
    Some(json) if !json.trim().is_empty() => serde_json::from_str(&json)
      .map_err(|e| eyre!("Failed to parse local overlay: {}", e)),
    _ => Ok(Vec::new()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::ProductDraft;
  use crate::storage::MemoryStorage;

  fn overlay() -> (Arc<MemoryStorage>, LocalOverlay<MemoryStorage>) {
    let store = Arc::new(MemoryStorage::new());
    (store.clone(), LocalOverlay::new(store))
  }

  #[test]
  fn test_missing_key_is_empty() {
    let (_, overlay) = overlay();
    assert!(overlay.load().is_empty());
    assert!(overlay.get(1).is_none());
  }

  #[test]
  fn test_modify_persists() {
    let (store, overlay) = overlay();
    overlay
      .modify(|local| local.push(ProductDraft::new("Ball", 10.0, 3).to_local_product(9, 0)))
      .unwrap();

    let raw = store.get(LOCAL_PRODUCTS_KEY).unwrap().unwrap();
    assert!(raw.contains("\"isLocal\":true"));
    assert_eq!(overlay.get(9).map(|p| p.name).as_deref(), Some("Ball"));
  }

  #[test]
  fn test_corrupt_overlay() {
    let (store, overlay) = overlay();
    store.set(LOCAL_PRODUCTS_KEY, "{not json").unwrap();

    assert!(overlay.load().is_empty());
    assert!(overlay.modify(|local| local.clear()).is_err());
    // Left as found
    assert_eq!(
      store.get(LOCAL_PRODUCTS_KEY).unwrap().as_deref(),
      Some("{not json")
    );
  }

  #[test]
  fn test_clear() {
    let (_, overlay) = overlay();
    overlay
      .modify(|local| local.push(ProductDraft::new("Ball", 10.0, 3).to_local_product(1, 0)))
      .unwrap();
    overlay.clear().unwrap();
    assert!(overlay.load().is_empty());
  }
}

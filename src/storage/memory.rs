use color_eyre::{eyre::eyre, Result};
use std::collections::HashMap;
use std::sync::Mutex;

use super::traits::LocalStore;

/// In-process storage. Contents are lost when the value is dropped.
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl LocalStore for MemoryStorage {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(entries.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    entries.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    entries.remove(key);
    Ok(())
  }

  fn update<T, F>(&self, key: &str, f: F) -> Result<T>
  where
    F: FnOnce(Option<String>) -> Result<(Option<String>, T)>,
  {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let (next, out) = f(entries.get(key).cloned())?;
    if let Some(value) = next {
      entries.insert(key.to_string(), value);
    }
    Ok(out)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_set_get_remove() {
    let store = MemoryStorage::new();
    assert_eq!(store.get("a").unwrap(), None);

    store.set("a", "1").unwrap();
    assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));

    store.remove("a").unwrap();
    store.remove("a").unwrap();
    assert_eq!(store.get("a").unwrap(), None);
  }

  #[test]
  fn test_update_none_leaves_value() {
    let store = MemoryStorage::new();
    store.set("k", "old").unwrap();

    let seen = store
      .update("k", |current| Ok((None, current)))
      .unwrap();
    assert_eq!(seen.as_deref(), Some("old"));
    assert_eq!(store.get("k").unwrap().as_deref(), Some("old"));
  }
}

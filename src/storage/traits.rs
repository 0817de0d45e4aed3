use color_eyre::Result;

/// Trait for local key/value storage backends.
///
/// Values are opaque strings; callers own the serialization format.
pub trait LocalStore: Send + Sync {
  /// Get the value stored under `key`.
  fn get(&self, key: &str) -> Result<Option<String>>;

  /// Store `value` under `key`, replacing any previous value.
  fn set(&self, key: &str, value: &str) -> Result<()>;

  /// Remove `key`. Removing a missing key is not an error.
  fn remove(&self, key: &str) -> Result<()>;

  /// Atomically read, transform and write back a single key.
  ///
  /// The closure receives the current value and returns the value to write
  /// (`None` leaves the stored value untouched) plus an output passed back
  /// to the caller. No other writer can interleave between the read and the
  /// write.
  fn update<T, F>(&self, key: &str, f: F) -> Result<T>
  where
    F: FnOnce(Option<String>) -> Result<(Option<String>, T)>;
}

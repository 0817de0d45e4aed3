//! Error types shared by the catalog store.

use thiserror::Error;

/// Errors surfaced to callers of the sync store.
///
/// Remote failures never appear here for product operations: they are
/// absorbed by the local fallback path. Only lookups that resolve nowhere,
/// rejected input, and writes with no fallback escape.
#[derive(Debug, Error)]
pub enum SyncError {
  #[error("{entity} {id} not found")]
  NotFound { entity: &'static str, id: i64 },

  #[error("invalid {field}: {message}")]
  Validation {
    field: &'static str,
    message: String,
  },

  /// The remote API is unreachable and the operation has no local fallback.
  #[error("{operation} unavailable while offline: {source}")]
  Unavailable {
    operation: &'static str,
    #[source]
    source: RemoteError,
  },

  #[error("image rejected: {0}")]
  Image(String),

  #[error("local storage error: {0}")]
  Storage(String),
}

impl SyncError {
  pub fn not_found(entity: &'static str, id: i64) -> Self {
    SyncError::NotFound { entity, id }
  }

  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    SyncError::Validation {
      field,
      message: message.into(),
    }
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, SyncError::NotFound { .. })
  }
}

/// Failure talking to the remote catalog API.
///
/// Transport failures and non-2xx responses are treated identically by the
/// store; the split only matters for logging and health reporting.
#[derive(Debug, Error)]
pub enum RemoteError {
  #[error("network failure: {0}")]
  Network(String),

  #[error("server responded with status {status}")]
  Server { status: u16 },

  #[error("failed to decode response: {0}")]
  Decode(String),

  #[error("failed to build request: {0}")]
  Request(String),
}

impl RemoteError {
  /// HTTP status for health reporting, 0 when no response arrived.
  pub fn status(&self) -> u16 {
    match self {
      RemoteError::Server { status } => *status,
      _ => 0,
    }
  }
}

impl From<reqwest::Error> for RemoteError {
  fn from(e: reqwest::Error) -> Self {
    if let Some(status) = e.status() {
      RemoteError::Server {
        status: status.as_u16(),
      }
    } else if e.is_decode() {
      RemoteError::Decode(e.to_string())
    } else if e.is_builder() {
      RemoteError::Request(e.to_string())
    } else {
      RemoteError::Network(e.to_string())
    }
  }
}

impl From<color_eyre::Report> for SyncError {
  fn from(e: color_eyre::Report) -> Self {
    SyncError::Storage(e.to_string())
  }
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

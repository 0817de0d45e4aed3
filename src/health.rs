//! API connectivity checks.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::CatalogApi;
use crate::storage::{LocalStore, HEALTH_STATUS_KEY};

/// Endpoint probed by `check_api_health`
pub const PRIMARY_ENDPOINT: &str = "/Products";

/// Endpoints probed by `test_all_endpoints`
pub const MAIN_ENDPOINTS: &[&str] = &["/Products", "/Categories", "/Products/most-selling"];

/// Result of a single health probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub endpoint: Option<String>,
  pub is_healthy: bool,
  /// HTTP status, 0 when no response arrived
  pub status: u16,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
  pub total: usize,
  pub healthy: usize,
  pub unhealthy: usize,
  pub results: Vec<HealthStatus>,
}

impl HealthSummary {
  fn from_results(results: Vec<HealthStatus>) -> Self {
    let healthy = results.iter().filter(|r| r.is_healthy).count();
    Self {
      total: results.len(),
      healthy,
      unhealthy: results.len() - healthy,
      results,
    }
  }
}

/// Probes the catalog API and keeps the last result in local storage.
pub struct HealthService<A: CatalogApi, S: LocalStore> {
  api: Arc<A>,
  store: Arc<S>,
}

impl<A: CatalogApi, S: LocalStore> Clone for HealthService<A, S> {
  fn clone(&self) -> Self {
    Self {
      api: Arc::clone(&self.api),
      store: Arc::clone(&self.store),
    }
  }
}

impl<A: CatalogApi + 'static, S: LocalStore + 'static> HealthService<A, S> {
  pub fn new(api: Arc<A>, store: Arc<S>) -> Self {
    Self { api, store }
  }

  /// Probe the products endpoint. Never fails; an unreachable API is
  /// reported as unhealthy.
  pub async fn check_api_health(&self) -> HealthStatus {
    let mut status = self.probe(PRIMARY_ENDPOINT).await;
    status.endpoint = None;
    status.message = if status.is_healthy {
      "API connected".to_string()
    } else {
      "API connection failed".to_string()
    };
    status
  }

  pub async fn check_endpoint_health(&self, endpoint: &str) -> HealthStatus {
    let mut status = self.probe(endpoint).await;
    status.message = if status.is_healthy {
      format!("Endpoint {} connected", endpoint)
    } else {
      format!("Endpoint {} connection failed", endpoint)
    };
    status
  }

  /// Probe every main endpoint concurrently.
  pub async fn test_all_endpoints(&self) -> HealthSummary {
    let results = join_all(
      MAIN_ENDPOINTS
        .iter()
        .map(|endpoint| self.check_endpoint_health(endpoint)),
    )
    .await;

    let summary = HealthSummary::from_results(results);
    info!(
      total = summary.total,
      healthy = summary.healthy,
      unhealthy = summary.unhealthy,
      "endpoint health summary"
    );
    summary
  }

  /// Last persisted status; `None` when nothing was stored or it can't be
  /// read back.
  pub fn last_health_status(&self) -> Option<HealthStatus> {
    let raw = match self.store.get(HEALTH_STATUS_KEY) {
      Ok(raw) => raw?,
      Err(e) => {
        warn!(error = %e, "reading health status failed");
        return None;
      }
    };

    serde_json::from_str(&raw)
      .map_err(|e| warn!(error = %e, "stored health status is corrupt"))
      .ok()
  }

  /// Check the API every `interval` in a background task, persisting each
  /// result. The task stops when the returned monitor is dropped.
  pub fn start_monitoring(&self, interval: Duration) -> HealthMonitor {
    let (tx, rx) = watch::channel(None);
    let service = self.clone();

    let task = tokio::spawn(async move {
      let start = tokio::time::Instant::now() + interval;
      let mut ticker = tokio::time::interval_at(start, interval);

      loop {
        ticker.tick().await;
        let health = service.check_api_health().await;
        debug!(healthy = health.is_healthy, status = health.status, "api health check");

        if !health.is_healthy {
          warn!(message = %health.message, error = ?health.error, "API is not responding");
        }
        service.persist(&health);

        if tx.send(Some(health)).is_err() {
          break;
        }
      }
    });

    HealthMonitor { task, updates: rx }
  }

  fn persist(&self, health: &HealthStatus) {
    let result = serde_json::to_string(health)
      .map_err(|e| color_eyre::eyre::eyre!("Failed to serialize health status: {}", e))
      .and_then(|json| self.store.set(HEALTH_STATUS_KEY, &json));

    if let Err(e) = result {
      warn!(error = %e, "persisting health status failed");
    }
  }

  async fn probe(&self, endpoint: &str) -> HealthStatus {
    let timestamp = Utc::now();
    match self.api.probe(endpoint).await {
      Ok(status) => HealthStatus {
        endpoint: Some(endpoint.to_string()),
        is_healthy: true,
        status,
        message: String::new(),
        error: None,
        timestamp,
      },
      Err(e) => HealthStatus {
        endpoint: Some(endpoint.to_string()),
        is_healthy: false,
        status: e.status(),
        message: String::new(),
        error: Some(e.to_string()),
        timestamp,
      },
    }
  }
}

/// Handle to a running health monitor. Dropping it stops the checks.
pub struct HealthMonitor {
  task: JoinHandle<()>,
  updates: watch::Receiver<Option<HealthStatus>>,
}

impl HealthMonitor {
  /// Receiver yielding each new check result.
  pub fn subscribe(&self) -> watch::Receiver<Option<HealthStatus>> {
    self.updates.clone()
  }
}

impl Drop for HealthMonitor {
  fn drop(&mut self) {
    self.task.abort();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::MemoryStorage;
  use crate::sync::fake::{FakeCatalog, Outage};

  fn service() -> (Arc<FakeCatalog>, HealthService<FakeCatalog, MemoryStorage>) {
    let api = Arc::new(FakeCatalog::new());
    let service = HealthService::new(api.clone(), Arc::new(MemoryStorage::new()));
    (api, service)
  }

  #[tokio::test]
  async fn test_healthy_api() {
    let (_, service) = service();
    let health = service.check_api_health().await;
    assert!(health.is_healthy);
    assert_eq!(health.status, 200);
    assert!(health.error.is_none());
  }

  #[tokio::test]
  async fn test_unhealthy_reports_status() {
    let (api, service) = service();

    api.set_outage(Some(Outage::Status(503)));
    let health = service.check_api_health().await;
    assert!(!health.is_healthy);
    assert_eq!(health.status, 503);

    api.set_outage(Some(Outage::Network));
    let health = service.check_endpoint_health("/Categories").await;
    assert_eq!(health.status, 0);
    assert_eq!(health.endpoint.as_deref(), Some("/Categories"));
    assert!(health.error.is_some());
  }

  #[tokio::test]
  async fn test_all_endpoints_summary() {
    let (api, service) = service();
    let summary = service.test_all_endpoints().await;
    assert_eq!((summary.total, summary.healthy, summary.unhealthy), (3, 3, 0));

    api.set_outage(Some(Outage::Status(500)));
    let summary = service.test_all_endpoints().await;
    assert_eq!((summary.total, summary.healthy, summary.unhealthy), (3, 0, 3));
    assert_eq!(summary.results[2].endpoint.as_deref(), Some("/Products/most-selling"));
  }

  #[tokio::test]
  async fn test_monitor_persists_status() {
    let (api, service) = service();
    api.set_outage(Some(Outage::Network));
    assert!(service.last_health_status().is_none());

    let monitor = service.start_monitoring(Duration::from_millis(20));
    let mut updates = monitor.subscribe();
    updates.changed().await.unwrap();

    let seen = updates.borrow().clone().unwrap();
    assert!(!seen.is_healthy);
    assert!(!service.last_health_status().unwrap().is_healthy);
  }

  #[test]
  fn test_corrupt_status_ignored() {
    let store = Arc::new(MemoryStorage::new());
    store.set(HEALTH_STATUS_KEY, "{not json").unwrap();
    let service = HealthService::new(Arc::new(FakeCatalog::new()), store);
    assert!(service.last_health_status().is_none());
  }

  #[test]
  fn test_status_json_shape() {
    let status = HealthStatus {
      endpoint: None,
      is_healthy: true,
      status: 200,
      message: "API connected".to_string(),
      error: None,
      timestamp: Utc::now(),
    };
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["isHealthy"], true);
    assert!(json.get("endpoint").is_none());
  }
}

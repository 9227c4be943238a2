//! # Inventory Gateway
//!
//! Commits drained batches to the inventory service, one request per code.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         commit_all(batch)                               │
//! │                                                                         │
//! │  DrainedBatch { A:2, B:1, C:5 }                                        │
//! │        │                                                                │
//! │        ├──► spawn ─► add_by_code("A", 2) ─► ok    ─► emit_committed    │
//! │        ├──► spawn ─► add_by_code("B", 1) ─► error ─► emit_commit_failed│
//! │        └──► spawn ─► add_by_code("C", 5) ─► ok    ─► emit_committed    │
//! │                                                                         │
//! │  • Calls are independent: one failure does not cancel the others       │
//! │  • The session never awaits them (fire and forget)                      │
//! │  • A failed code is NOT put back into any batch                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## HTTP Endpoints (inventory service)
//! ```text
//! GET  /inventory/?fields=ID,code   → [{"ID": 1, "code": "A"}, ...]
//! POST /inventory/{ID}/add/         ← {"quantity": 2}
//! ```
//! The service adds by numeric ID, so [`HttpSyncGateway`] keeps a code → ID
//! index, refreshed from the listing whenever a code is not in it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use stockscan_core::{BatchEntry, DrainedBatch};

use crate::config::{CommitPolicy, CommitSettings, GatewaySettings, ScanConfig};
use crate::error::{SyncError, SyncResult};
use crate::events::ScanEventEmitter;

// =============================================================================
// Gateway Trait
// =============================================================================

/// Backend that stores scanned quantities.
#[async_trait]
pub trait SyncGateway: Send + Sync {
    /// Adds `quantity` units to the inventory item identified by `code`.
    async fn add_by_code(&self, code: &str, quantity: u32) -> SyncResult<()>;
}

// =============================================================================
// Batch Commit
// =============================================================================

/// Result of committing one entry of a drained batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Batch the entry belonged to.
    pub batch_id: Uuid,
    /// The committed entry.
    pub entry: BatchEntry,
    /// Error message if the commit failed.
    pub error: Option<String>,
}

impl CommitOutcome {
    /// Returns true if the entry was stored.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Dispatches one independent commit task per entry of `batch`.
///
/// Returns immediately. The returned handles may be awaited or dropped;
/// dropping them does not cancel the commits.
pub fn commit_all(
    gateway: Arc<dyn SyncGateway>,
    emitter: Arc<dyn ScanEventEmitter>,
    batch: &DrainedBatch,
) -> Vec<JoinHandle<CommitOutcome>> {
    let batch_id = batch.id;

    batch
        .entries
        .iter()
        .cloned()
        .map(|entry| {
            let gateway = gateway.clone();
            let emitter = emitter.clone();

            tokio::spawn(async move {
                match gateway.add_by_code(&entry.code, entry.quantity).await {
                    Ok(()) => {
                        info!(
                            batch_id = %batch_id,
                            code = %entry.code,
                            quantity = entry.quantity,
                            "Committed scanned quantity"
                        );
                        emitter.emit_committed(batch_id, &entry);
                        CommitOutcome {
                            batch_id,
                            entry,
                            error: None,
                        }
                    }
                    Err(e) => {
                        error!(
                            batch_id = %batch_id,
                            code = %entry.code,
                            quantity = entry.quantity,
                            error = %e,
                            "Failed to commit scanned quantity"
                        );
                        let message = e.to_string();
                        emitter.emit_commit_failed(batch_id, &entry, &message);
                        CommitOutcome {
                            batch_id,
                            entry,
                            error: Some(message),
                        }
                    }
                }
            })
        })
        .collect()
}

// =============================================================================
// HTTP Gateway
// =============================================================================

/// Row of the inventory listing, restricted to `ID,code`.
#[derive(Debug, Clone, Deserialize)]
struct InventoryRef {
    #[serde(rename = "ID")]
    id: i64,
    code: String,
}

/// Body of the "add quantity" request.
#[derive(Debug, Serialize)]
struct QuantityPayload {
    quantity: u32,
}

/// Gateway talking to the inventory service over HTTP.
pub struct HttpSyncGateway {
    client: reqwest::Client,
    base_url: Url,
    ids: RwLock<HashMap<String, i64>>,
}

impl HttpSyncGateway {
    /// Creates a gateway for the configured service.
    pub fn new(settings: &GatewaySettings) -> SyncResult<Self> {
        let mut base_url = Url::parse(&settings.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(HttpSyncGateway {
            client,
            base_url,
            ids: RwLock::new(HashMap::new()),
        })
    }

    /// Builds an absolute URL below the base URL.
    fn endpoint(&self, path: &str) -> SyncResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Reloads the code → ID index from the inventory listing.
    async fn refresh_ids(&self) -> SyncResult<()> {
        let url = self.endpoint("inventory/")?;
        let response = self
            .client
            .get(url)
            .query(&[("fields", "ID,code")])
            .send()
            .await?;
        let response = check_status(response).await?;
        let rows: Vec<InventoryRef> = response.json().await?;

        let mut ids = self.ids.write().await;
        ids.clear();
        for row in rows {
            // First item wins if the service holds duplicate codes
            ids.entry(row.code).or_insert(row.id);
        }
        debug!(items = ids.len(), "Refreshed inventory code index");

        Ok(())
    }

    /// Resolves an item code to the service's numeric ID.
    async fn resolve_id(&self, code: &str) -> SyncResult<i64> {
        if let Some(id) = self.ids.read().await.get(code) {
            return Ok(*id);
        }

        self.refresh_ids().await?;

        self.ids
            .read()
            .await
            .get(code)
            .copied()
            .ok_or_else(|| SyncError::UnknownCode(code.to_string()))
    }
}

#[async_trait]
impl SyncGateway for HttpSyncGateway {
    async fn add_by_code(&self, code: &str, quantity: u32) -> SyncResult<()> {
        let id = self.resolve_id(code).await?;
        let url = self.endpoint(&format!("inventory/{}/add/", id))?;

        let response = self
            .client
            .post(url)
            .json(&QuantityPayload { quantity })
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            // Item deleted since the index was built
            self.ids.write().await.remove(code);
        }
        check_status(response).await?;

        Ok(())
    }
}

/// Turns a non-success response into [`SyncError::Rejected`].
async fn check_status(response: reqwest::Response) -> SyncResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(SyncError::Rejected {
        status: status.as_u16(),
        message,
    })
}

// =============================================================================
// Retrying Gateway
// =============================================================================

/// Backoff parameters for [`RetryingGateway`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// First wait after a failure.
    pub initial_backoff: Duration,
    /// Upper bound for a single wait.
    pub max_backoff: Duration,
    /// Give up after this long (`None` = never).
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&CommitSettings::default())
    }
}

impl From<&CommitSettings> for RetryPolicy {
    fn from(settings: &CommitSettings) -> Self {
        RetryPolicy {
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_secs(settings.max_backoff_secs),
            max_elapsed: match settings.max_elapsed_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

/// Decorator that retries transient failures of another gateway.
///
/// Only errors with [`SyncError::is_retryable`] are retried; unknown codes
/// and other client errors fail on the first attempt.
pub struct RetryingGateway<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: SyncGateway> RetryingGateway<G> {
    /// Wraps `inner`.
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        RetryingGateway { inner, policy }
    }

    /// Creates the exponential backoff configuration.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.policy.initial_backoff,
            initial_interval: self.policy.initial_backoff,
            max_interval: self.policy.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: self.policy.max_elapsed,
            ..Default::default()
        }
    }
}

#[async_trait]
impl<G: SyncGateway> SyncGateway for RetryingGateway<G> {
    async fn add_by_code(&self, code: &str, quantity: u32) -> SyncResult<()> {
        let operation = || async {
            self.inner
                .add_by_code(code, quantity)
                .await
                .map_err(|e| {
                    if e.is_retryable() {
                        warn!(code = %code, error = %e, "Commit failed, retrying");
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
        };

        backoff::future::retry(self.create_backoff(), operation).await
    }
}

// =============================================================================
// Construction
// =============================================================================

/// Builds the gateway described by `config` (HTTP, optionally retrying).
pub fn build_gateway(config: &ScanConfig) -> SyncResult<Arc<dyn SyncGateway>> {
    let http = HttpSyncGateway::new(&config.gateway)?;

    info!(
        url = %config.gateway.base_url,
        policy = %config.commit.policy,
        "Inventory gateway configured"
    );

    Ok(match config.commit.policy {
        CommitPolicy::FireAndForget => Arc::new(http),
        CommitPolicy::Retry => Arc::new(RetryingGateway::new(
            http,
            RetryPolicy::from(&config.commit),
        )),
    })
}

// =============================================================================
// Test Gateways
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    /// Records every call; fails for the configured codes.
    pub struct RecordingGateway {
        calls: mpsc::UnboundedSender<(String, u32)>,
        unknown: HashSet<String>,
    }

    impl RecordingGateway {
        pub fn new() -> (Self, mpsc::UnboundedReceiver<(String, u32)>) {
            Self::failing_for(&[])
        }

        pub fn failing_for(codes: &[&str]) -> (Self, mpsc::UnboundedReceiver<(String, u32)>) {
            let (calls, rx) = mpsc::unbounded_channel();
            let gateway = RecordingGateway {
                calls,
                unknown: codes.iter().map(|c| c.to_string()).collect(),
            };
            (gateway, rx)
        }
    }

    #[async_trait]
    impl SyncGateway for RecordingGateway {
        async fn add_by_code(&self, code: &str, quantity: u32) -> SyncResult<()> {
            let _ = self.calls.send((code.to_string(), quantity));
            if self.unknown.contains(code) {
                return Err(SyncError::UnknownCode(code.to_string()));
            }
            Ok(())
        }
    }

    /// Fails with `error()` for the first `failures` calls, then succeeds.
    pub struct FlakyGateway<F> {
        pub attempts: Arc<AtomicUsize>,
        failures: usize,
        error: F,
    }

    impl<F: Fn() -> SyncError + Send + Sync> FlakyGateway<F> {
        pub fn new(failures: usize, error: F) -> Self {
            FlakyGateway {
                attempts: Arc::new(AtomicUsize::new(0)),
                failures,
                error,
            }
        }
    }

    #[async_trait]
    impl<F: Fn() -> SyncError + Send + Sync> SyncGateway for FlakyGateway<F> {
        async fn add_by_code(&self, _code: &str, _quantity: u32) -> SyncResult<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                Err((self.error)())
            } else {
                Ok(())
            }
        }
    }
}

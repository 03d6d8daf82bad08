/*
[INPUT]:  Tracking identifier, attempt budget, fixed interval, transaction source
[OUTPUT]: StatusObservation after a terminal status or an exhausted budget
[POS]:    Status layer - polling strategy
[UPDATE]: When polling cadence, budget semantics or the source seam change
*/

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{ObserverMode, StatusObservation, TransactionStatusObserver};
use crate::checkout::TrackingId;
use crate::http::{OnrampClient, OnrampError, Result};
use crate::types::{Transaction, TransactionsQuery};

const DEFAULT_MAX_ATTEMPTS: u32 = 30;
const DEFAULT_INTERVAL_SECS: u64 = 10;

/// Where the poller reads the latest transaction from
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// `Ok(None)` means "not yet available"
    async fn latest_transaction(&self, tracking_id: &TrackingId) -> Result<Option<Transaction>>;
}

#[async_trait]
impl TransactionSource for OnrampClient {
    async fn latest_transaction(&self, tracking_id: &TrackingId) -> Result<Option<Transaction>> {
        let page = self
            .transactions(tracking_id.as_str(), &TransactionsQuery::latest())
            .await?;
        Ok(page.transactions.into_iter().next())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerConfig {
    pub max_attempts: u32,
    #[serde(with = "duration_secs")]
    pub interval: Duration,
}

impl PollerConfig {
    pub fn new(max_attempts: u32, interval: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(OnrampError::Config(
                "poller needs at least one attempt".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            interval,
        })
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Fixed-interval, fixed-budget poller. No backoff, no mid-wait cancellation.
pub struct StatusPoller {
    source: Arc<dyn TransactionSource>,
    config: PollerConfig,
}

impl StatusPoller {
    pub fn new(source: Arc<dyn TransactionSource>, config: PollerConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> PollerConfig {
        self.config
    }

    pub async fn poll(&self, tracking_id: &TrackingId) -> Result<StatusObservation> {
        let mut observation = StatusObservation::new(tracking_id, ObserverMode::Polling);
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            observation.attempts = attempt;

            let latest = self
                .source
                .latest_transaction(tracking_id)
                .await
                .inspect_err(|err| {
                    warn!(tracking_id = %tracking_id, attempt, error = %err, "status poll failed");
                })?;

            match latest {
                Some(transaction) => {
                    let status = transaction.status;
                    info!(tracking_id = %tracking_id, attempt, max_attempts, status = %status, "transaction status");
                    observation.last_status = Some(status);
                    observation.transaction = Some(transaction);
                    if status.is_terminal() {
                        return Ok(observation);
                    }
                }
                None => {
                    debug!(tracking_id = %tracking_id, attempt, max_attempts, "no transaction yet");
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.config.interval).await;
            }
        }

        warn!(
            tracking_id = %tracking_id,
            attempts = max_attempts,
            last_status = ?observation.last_status,
            "attempt budget exhausted without terminal status"
        );
        Ok(observation)
    }
}

#[async_trait]
impl TransactionStatusObserver for StatusPoller {
    fn mode(&self) -> ObserverMode {
        ObserverMode::Polling
    }

    async fn observe(&self, tracking_id: &TrackingId) -> Result<StatusObservation> {
        self.poll(tracking_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionStatus;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Replays a fixed script, then repeats the last entry
    struct ScriptedSource {
        script: Mutex<VecDeque<Option<TransactionStatus>>>,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        fn new(script: Vec<Option<TransactionStatus>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TransactionSource for ScriptedSource {
        async fn latest_transaction(&self, _id: &TrackingId) -> Result<Option<Transaction>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            let next = if script.len() > 1 {
                script.pop_front().flatten()
            } else {
                script.front().copied().flatten()
            };
            Ok(next.map(|status| {
                serde_json::from_value(serde_json::json!({ "status": status })).unwrap()
            }))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl TransactionSource for FailingSource {
        async fn latest_transaction(&self, _id: &TrackingId) -> Result<Option<Transaction>> {
            Err(OnrampError::Api {
                status: 500,
                body: "boom".to_string(),
            })
        }
    }

    fn fast(max_attempts: u32) -> PollerConfig {
        PollerConfig::new(max_attempts, Duration::from_millis(1)).unwrap()
    }

    #[tokio::test]
    async fn test_pending_twice_then_success() {
        let source = ScriptedSource::new(vec![
            Some(TransactionStatus::Pending),
            Some(TransactionStatus::Pending),
            Some(TransactionStatus::Success),
        ]);
        let poller = StatusPoller::new(source.clone(), fast(10));

        let outcome = poller.poll(&TrackingId::new("u-1")).await.unwrap();

        assert_eq!(source.calls(), 3);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.last_status, Some(TransactionStatus::Success));
        assert!(outcome.is_terminal());
        assert!(outcome.transaction.is_some());
    }

    #[tokio::test]
    async fn test_empty_results_exhaust_budget() {
        let source = ScriptedSource::new(vec![None]);
        let poller = StatusPoller::new(source.clone(), fast(4));

        let outcome = poller.poll(&TrackingId::new("u-1")).await.unwrap();

        assert_eq!(source.calls(), 4);
        assert_eq!(outcome.attempts, 4);
        assert_eq!(outcome.last_status, None);
        assert!(!outcome.is_terminal());
    }

    #[tokio::test]
    async fn test_never_exceeds_budget_with_non_terminal_status() {
        let source = ScriptedSource::new(vec![Some(TransactionStatus::Processing)]);
        let poller = StatusPoller::new(source.clone(), fast(5));

        let outcome = poller.poll(&TrackingId::new("u-1")).await.unwrap();

        assert_eq!(source.calls(), 5);
        assert_eq!(outcome.last_status, Some(TransactionStatus::Processing));
        assert!(!outcome.is_terminal());
    }

    #[tokio::test]
    async fn test_terminal_on_first_attempt_stops_immediately() {
        let source = ScriptedSource::new(vec![Some(TransactionStatus::Failed)]);
        let poller = StatusPoller::new(source.clone(), fast(5));

        let outcome = poller.poll(&TrackingId::new("u-1")).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(outcome.last_status, Some(TransactionStatus::Failed));
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let poller = StatusPoller::new(Arc::new(FailingSource), fast(3));
        let err = poller.poll(&TrackingId::new("u-1")).await.unwrap_err();
        assert!(matches!(err, OnrampError::Api { status: 500, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_interval_between_attempts_only() {
        let source = ScriptedSource::new(vec![None]);
        let config = PollerConfig::new(3, Duration::from_secs(10)).unwrap();
        let poller = StatusPoller::new(source, config);

        let started = tokio::time::Instant::now();
        poller.poll(&TrackingId::new("u-1")).await.unwrap();

        // two waits for three attempts
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(20));
        assert!(elapsed < Duration::from_secs(30));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        assert!(PollerConfig::new(0, Duration::from_secs(1)).is_err());
    }
}

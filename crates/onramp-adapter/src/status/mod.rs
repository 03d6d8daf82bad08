/*
[INPUT]:  Tracking identifier and observer configuration
[OUTPUT]: Final observed transaction status (or "none yet")
[POS]:    Status layer - "observe transaction status" capability
[UPDATE]: When adding observer strategies or changing the observation result
*/

//! Transaction status observation.
//!
//! Two interchangeable strategies implement [`TransactionStatusObserver`]:
//! [`StatusPoller`] queries the transaction endpoint on a fixed interval, and
//! [`WebhookObserver`] listens for provider callbacks. Which one runs is a
//! configuration choice ([`ObserverMode`]).

pub mod poller;
pub mod webhook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::checkout::TrackingId;
use crate::http::Result;
use crate::types::{Transaction, TransactionStatus};

pub use poller::{PollerConfig, StatusPoller, TransactionSource};
pub use webhook::{
    WebhookEvent, WebhookEventKind, WebhookListenerConfig, WebhookObserver, serve_webhooks,
    webhook_router,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObserverMode {
    #[default]
    Polling,
    Webhook,
}

/// What an observer saw before it stopped
#[derive(Debug, Clone, PartialEq)]
pub struct StatusObservation {
    pub tracking_id: TrackingId,
    pub mode: ObserverMode,
    /// Poll attempts made, or matching webhook events received
    pub attempts: u32,
    pub last_status: Option<TransactionStatus>,
    /// Latest full record, when the strategy has one
    pub transaction: Option<Transaction>,
}

impl StatusObservation {
    pub(crate) fn new(tracking_id: &TrackingId, mode: ObserverMode) -> Self {
        Self {
            tracking_id: tracking_id.clone(),
            mode,
            attempts: 0,
            last_status: None,
            transaction: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.last_status.is_some_and(TransactionStatus::is_terminal)
    }
}

#[async_trait]
pub trait TransactionStatusObserver: Send + Sync {
    fn mode(&self) -> ObserverMode;

    /// Watch `tracking_id` until a terminal status or the strategy's budget runs out
    async fn observe(&self, tracking_id: &TrackingId) -> Result<StatusObservation>;
}

/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of an onramp transaction, owned by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    #[serde(
        rename = "pending",
        alias = "PENDING",
        alias = "ONRAMP_TRANSACTION_STATUS_CREATED",
        alias = "ONRAMP_TRANSACTION_STATUS_PENDING"
    )]
    Pending,
    #[serde(
        rename = "processing",
        alias = "PROCESSING",
        alias = "IN_PROGRESS",
        alias = "ONRAMP_TRANSACTION_STATUS_IN_PROGRESS"
    )]
    Processing,
    #[serde(
        rename = "success",
        alias = "SUCCESS",
        alias = "completed",
        alias = "ONRAMP_TRANSACTION_STATUS_SUCCESS"
    )]
    Success,
    #[serde(
        rename = "failed",
        alias = "FAILED",
        alias = "ONRAMP_TRANSACTION_STATUS_FAILED"
    )]
    Failed,
    #[serde(
        rename = "canceled",
        alias = "cancelled",
        alias = "CANCELED",
        alias = "ONRAMP_TRANSACTION_STATUS_CANCELED"
    )]
    Canceled,
}

impl TransactionStatus {
    /// No further transition is expected once a transaction reaches one of these.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionStatus::Success | TransactionStatus::Failed | TransactionStatus::Canceled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checkout experience preselected in the hosted widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceMode {
    Buy,
    Send,
}

impl ExperienceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExperienceMode::Buy => "buy",
            ExperienceMode::Send => "send",
        }
    }
}

/// Event names used both when registering webhooks and when receiving them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEventType {
    #[serde(rename = "onramp.transaction.created")]
    TransactionCreated,
    #[serde(
        rename = "onramp.transaction.completed",
        alias = "onramp.transaction.success"
    )]
    TransactionCompleted,
    #[serde(rename = "onramp.transaction.failed")]
    TransactionFailed,
    #[serde(rename = "onramp.session.updated")]
    SessionUpdated,
}

impl WebhookEventType {
    pub const ALL: [WebhookEventType; 4] = [
        WebhookEventType::TransactionCreated,
        WebhookEventType::TransactionCompleted,
        WebhookEventType::TransactionFailed,
        WebhookEventType::SessionUpdated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WebhookEventType::TransactionCreated => "onramp.transaction.created",
            WebhookEventType::TransactionCompleted => "onramp.transaction.completed",
            WebhookEventType::TransactionFailed => "onramp.transaction.failed",
            WebhookEventType::SessionUpdated => "onramp.session.updated",
        }
    }

    /// Parse a wire event name, accepting the `success` spelling of completion.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "onramp.transaction.created" => Some(WebhookEventType::TransactionCreated),
            "onramp.transaction.completed" | "onramp.transaction.success" => {
                Some(WebhookEventType::TransactionCompleted)
            }
            "onramp.transaction.failed" => Some(WebhookEventType::TransactionFailed),
            "onramp.session.updated" => Some(WebhookEventType::SessionUpdated),
            _ => None,
        }
    }

    /// Status implied by the event itself, when it carries none explicitly
    pub fn implied_status(self) -> Option<TransactionStatus> {
        match self {
            WebhookEventType::TransactionCreated => Some(TransactionStatus::Pending),
            WebhookEventType::TransactionCompleted => Some(TransactionStatus::Success),
            WebhookEventType::TransactionFailed => Some(TransactionStatus::Failed),
            WebhookEventType::SessionUpdated => None,
        }
    }
}

impl fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust model structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{TransactionStatus, WebhookEventType};

/// How long the provider honours a session token after issuance
pub const SESSION_TOKEN_TTL_SECS: i64 = 5 * 60;

/// Destination wallet and the networks it may receive on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address: String,
    pub blockchains: Vec<String>,
}

impl Address {
    pub fn new<I, S>(address: impl Into<String>, blockchains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            address: address.into(),
            blockchains: blockchains.into_iter().map(Into::into).collect(),
        }
    }
}

/// Single-use checkout credential.
///
/// Deliberately not `Clone`: building a checkout URL consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct SessionToken {
    token: String,
    channel_id: Option<String>,
    issued_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn new(token: impl Into<String>, channel_id: Option<String>) -> Self {
        Self::issued_at(token, channel_id, Utc::now())
    }

    pub fn issued_at(
        token: impl Into<String>,
        channel_id: Option<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token: token.into(),
            channel_id,
            issued_at,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.channel_id.as_deref()
    }

    pub fn issued(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(SESSION_TOKEN_TTL_SECS)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at()
    }

    pub fn into_inner(self) -> String {
        self.token
    }
}

/// Currency amount as reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub value: Decimal,
    pub currency: String,
}

/// One onramp transaction record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub status: TransactionStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub partner_user_ref: Option<String>,
    #[serde(default)]
    pub purchase_currency: Option<String>,
    #[serde(default)]
    pub purchase_network: Option<String>,
    #[serde(default)]
    pub purchase_amount: Option<Amount>,
    #[serde(default)]
    pub payment_total: Option<Amount>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// Remote webhook subscription; lifecycle owned by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRegistration {
    pub id: String,
    #[serde(alias = "notificationUri")]
    pub notification_uri: String,
    #[serde(alias = "eventType")]
    pub event_type: WebhookEventType,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
}

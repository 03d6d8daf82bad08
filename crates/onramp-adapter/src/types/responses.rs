/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::models::{Transaction, WebhookRegistration};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokenResponse {
    pub token: String,
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionsPage {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub next_page_key: Option<String>,
    #[serde(default)]
    pub total_count: Option<String>,
}

impl TransactionsPage {
    /// Most recent record; the provider lists newest first.
    pub fn latest(&self) -> Option<&Transaction> {
        self.transactions.first()
    }

    pub fn has_more(&self) -> bool {
        self.next_page_key
            .as_deref()
            .is_some_and(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookList {
    #[serde(default)]
    pub webhooks: Vec<WebhookRegistration>,
}

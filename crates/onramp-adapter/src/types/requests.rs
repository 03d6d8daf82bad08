/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust request structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::enums::WebhookEventType;
use super::models::Address;
use crate::http::{OnrampError, Result};

/// Body of `POST /onramp/v1/token`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokenRequest {
    pub addresses: Vec<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<String>>,
}

impl SessionTokenRequest {
    pub fn new(addresses: Vec<Address>) -> Self {
        Self {
            addresses,
            assets: None,
        }
    }

    /// Restrict the widget to an asset allow-list; an empty list means "no restriction".
    pub fn with_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let assets: Vec<String> = assets.into_iter().map(Into::into).collect();
        self.assets = if assets.is_empty() { None } else { Some(assets) };
        self
    }

    /// Reject payloads the provider would refuse anyway.
    pub fn validate(&self) -> Result<()> {
        if self.addresses.is_empty() {
            return Err(OnrampError::InvalidRequest(
                "at least one destination address is required".to_string(),
            ));
        }
        for entry in &self.addresses {
            if entry.address.trim().is_empty() {
                return Err(OnrampError::InvalidRequest(
                    "destination address must not be empty".to_string(),
                ));
            }
            if entry.blockchains.is_empty() {
                return Err(OnrampError::InvalidRequest(format!(
                    "address {} has no target blockchains",
                    entry.address
                )));
            }
        }
        Ok(())
    }
}

/// Paging parameters for the transaction status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
}

impl TransactionsQuery {
    /// Only the most recent record
    pub fn latest() -> Self {
        Self {
            page_size: Some(1),
            page_key: None,
        }
    }
}

/// Body of `POST /onramp/v1/webhooks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWebhookRequest {
    pub notification_uri: String,
    pub event_type: WebhookEventType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_request_serializes_without_assets() {
        let request = SessionTokenRequest::new(vec![Address::new("0xabc", ["base"])]);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"addresses": [{"address": "0xabc", "blockchains": ["base"]}]})
        );
    }

    #[test]
    fn test_session_request_empty_asset_list_is_dropped() {
        let request = SessionTokenRequest::new(vec![Address::new("0xabc", ["base"])])
            .with_assets(Vec::<String>::new());
        assert!(request.assets.is_none());

        let request = request.with_assets(["USDC", "ETH"]);
        assert_eq!(request.assets, Some(vec!["USDC".to_string(), "ETH".to_string()]));
    }

    #[test]
    fn test_session_request_validation() {
        assert!(SessionTokenRequest::new(vec![]).validate().is_err());
        assert!(
            SessionTokenRequest::new(vec![Address::new("0xabc", Vec::<String>::new())])
                .validate()
                .is_err()
        );
        assert!(
            SessionTokenRequest::new(vec![Address::new("  ", ["base"])])
                .validate()
                .is_err()
        );
        assert!(
            SessionTokenRequest::new(vec![Address::new("0xabc", ["base", "ethereum"])])
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_create_webhook_request_wire_format() {
        let request = CreateWebhookRequest {
            notification_uri: "https://example.com/hook".to_string(),
            event_type: WebhookEventType::TransactionCompleted,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "notification_uri": "https://example.com/hook",
                "event_type": "onramp.transaction.completed",
            })
        );
    }
}

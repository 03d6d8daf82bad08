/*
[INPUT]:  Partner user id (tracking identifier) and paging parameters
[OUTPUT]: Transaction records for that user, newest first
[POS]:    HTTP layer - transaction status endpoint (JWT auth)
[UPDATE]: When adding filters or changing the status response schema
*/

use reqwest::Method;
use tracing::debug;

use crate::http::{OnrampClient, OnrampError, Result};
use crate::types::{TransactionsPage, TransactionsQuery};

impl OnrampClient {
    /// Query onramp transactions for a partner user id
    ///
    /// GET /onramp/v1/buy/user/{partner_user_id}/transactions?page_size={n}&page_key={key}
    pub async fn transactions(
        &self,
        partner_user_id: &str,
        query: &TransactionsQuery,
    ) -> Result<TransactionsPage> {
        if partner_user_id.trim().is_empty() {
            return Err(OnrampError::InvalidRequest(
                "partner user id must not be empty".to_string(),
            ));
        }

        let mut url = self.endpoint_url("/onramp/v1/buy/user")?;
        url.path_segments_mut()
            .map_err(|_| OnrampError::Config("base URL cannot hold a path".to_string()))?
            .push(partner_user_id)
            .push("transactions");

        let builder = self.authorized_request(Method::GET, url)?.query(query);
        let page: TransactionsPage = self.send_json(builder).await?;

        debug!(
            partner_user_id,
            count = page.transactions.len(),
            has_more = page.has_more(),
            "transactions fetched"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CdpCredentials, Ed25519Signer};
    use crate::http::ClientConfig;
    use crate::types::TransactionStatus;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OnrampClient {
        let creds =
            CdpCredentials::new("key-1", Ed25519Signer::generate().to_key_secret()).unwrap();
        OnrampClient::with_config_and_base_url(&creds, ClientConfig::default(), &server.uri())
            .expect("client init")
    }

    #[tokio::test]
    async fn test_transactions_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/onramp/v1/buy/user/demo-user-1700000000000/transactions"))
            .and(query_param("page_size", "5"))
            .and(query_param("page_key", "next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "transactions": [{
                    "status": "ONRAMP_TRANSACTION_STATUS_SUCCESS",
                    "transaction_id": "tx-1",
                    "purchase_amount": {"value": "10", "currency": "USDC"}
                }],
                "next_page_key": "",
                "total_count": "1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = TransactionsQuery {
            page_size: Some(5),
            page_key: Some("next".to_string()),
        };
        let page = client_for(&server)
            .transactions("demo-user-1700000000000", &query)
            .await
            .expect("transactions failed");

        assert_eq!(page.transactions.len(), 1);
        assert_eq!(page.latest().unwrap().status, TransactionStatus::Success);
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn test_transactions_empty_list_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/onramp/v1/buy/user/nobody/transactions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"transactions": []})),
            )
            .mount(&server)
            .await;

        let page = client_for(&server)
            .transactions("nobody", &TransactionsQuery::latest())
            .await
            .expect("transactions failed");
        assert!(page.latest().is_none());
    }

    #[tokio::test]
    async fn test_transactions_rejects_empty_id() {
        let server = MockServer::start().await;
        let err = client_for(&server)
            .transactions(" ", &TransactionsQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OnrampError::InvalidRequest(_)));
    }
}

/*
[INPUT]:  Notification URI, event type, webhook id
[OUTPUT]: Remote webhook registrations (create/list/delete)
[POS]:    HTTP layer - webhook management endpoints (JWT auth)
[UPDATE]: When the provider ships or changes webhook management
*/

// The provider currently answers these routes with 404; callers see
// `OnrampError::Api { status: 404, .. }` and can test `is_not_found()`.

use reqwest::Method;
use tracing::info;

use crate::http::{OnrampClient, OnrampError, Result};
use crate::types::{CreateWebhookRequest, WebhookEventType, WebhookList, WebhookRegistration};

pub const WEBHOOKS_ENDPOINT: &str = "/onramp/v1/webhooks";

impl OnrampClient {
    /// Register a notification URI for one event type
    ///
    /// POST /onramp/v1/webhooks
    pub async fn create_webhook(
        &self,
        notification_uri: &str,
        event_type: WebhookEventType,
    ) -> Result<WebhookRegistration> {
        url::Url::parse(notification_uri)?;
        let request = CreateWebhookRequest {
            notification_uri: notification_uri.to_string(),
            event_type,
        };

        let url = self.endpoint_url(WEBHOOKS_ENDPOINT)?;
        let builder = self.authorized_request(Method::POST, url)?.json(&request);
        let registration: WebhookRegistration = self.send_json(builder).await?;

        info!(id = %registration.id, event_type = %event_type, "webhook registered");
        Ok(registration)
    }

    /// List registered webhooks
    ///
    /// GET /onramp/v1/webhooks
    pub async fn list_webhooks(&self) -> Result<Vec<WebhookRegistration>> {
        let url = self.endpoint_url(WEBHOOKS_ENDPOINT)?;
        let builder = self.authorized_request(Method::GET, url)?;
        let list: WebhookList = self.send_json(builder).await?;
        Ok(list.webhooks)
    }

    /// Delete a webhook registration
    ///
    /// DELETE /onramp/v1/webhooks/{id}
    pub async fn delete_webhook(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(OnrampError::InvalidRequest(
                "webhook id must not be empty".to_string(),
            ));
        }

        let mut url = self.endpoint_url(WEBHOOKS_ENDPOINT)?;
        url.path_segments_mut()
            .map_err(|_| OnrampError::Config("base URL cannot hold a path".to_string()))?
            .push(id);

        let builder = self.authorized_request(Method::DELETE, url)?;
        self.send_empty(builder).await?;
        info!(id, "webhook deleted");
        Ok(())
    }
}

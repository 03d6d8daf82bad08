/*
[INPUT]:  Wallet addresses, target networks, optional asset allow-list
[OUTPUT]: Single-use session token for one checkout attempt
[POS]:    HTTP layer - session token endpoint (JWT auth)
[UPDATE]: When the token request/response schema changes
*/

use reqwest::Method;
use tracing::info;

use crate::http::{OnrampClient, OnrampError, Result};
use crate::types::{SessionToken, SessionTokenRequest, SessionTokenResponse};

pub const SESSION_TOKEN_ENDPOINT: &str = "/onramp/v1/token";

impl OnrampClient {
    /// Exchange a freshly signed JWT for a session token
    ///
    /// POST /onramp/v1/token
    pub async fn create_session_token(&self, request: &SessionTokenRequest) -> Result<SessionToken> {
        request.validate()?;

        let url = self.endpoint_url(SESSION_TOKEN_ENDPOINT)?;
        let builder = self.authorized_request(Method::POST, url)?.json(request);
        let response: SessionTokenResponse = self.send_json(builder).await?;

        if response.token.is_empty() {
            return Err(OnrampError::InvalidResponse(
                "session token response carried an empty token".to_string(),
            ));
        }

        info!(
            addresses = request.addresses.len(),
            channel_id = response.channel_id.as_deref().unwrap_or(""),
            "session token issued"
        );
        Ok(SessionToken::new(response.token, response.channel_id))
    }
}

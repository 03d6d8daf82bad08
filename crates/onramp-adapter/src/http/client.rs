/*
[INPUT]:  HTTP configuration (base URL, timeouts, token lifetime) and CDP credentials
[OUTPUT]: Configured client that signs every request with a fresh JWT
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::{CdpCredentials, JwtSigner, TokenTarget, jwt::DEFAULT_TOKEN_EXPIRY};
use crate::http::{OnrampError, Result};

/// Base URL for the CDP onramp API
pub const API_BASE_URL: &str = "https://api.developer.coinbase.com";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub token_expiry: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            token_expiry: DEFAULT_TOKEN_EXPIRY,
        }
    }
}

/// Explicitly constructed client for the onramp API; holds no process-wide state
#[derive(Debug)]
pub struct OnrampClient {
    http_client: Client,
    base_url: Url,
    signer: JwtSigner,
}

impl OnrampClient {
    /// Create a new client with default configuration
    pub fn new(credentials: &CdpCredentials) -> Result<Self> {
        Self::with_config(credentials, ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(credentials: &CdpCredentials, config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(credentials, config, API_BASE_URL)
    }

    /// Create a client against a non-default API host (sandbox, mock server)
    pub fn with_config_and_base_url(
        credentials: &CdpCredentials,
        config: ClientConfig,
        base_url: &str,
    ) -> Result<Self> {
        let signer = JwtSigner::from_credentials(credentials)?.with_expiry(config.token_expiry)?;

        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
            signer,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn signer(&self) -> &JwtSigner {
        &self.signer
    }

    /// Build full URL for an API endpoint
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint)?)
    }

    /// Build a request carrying a bearer token minted for exactly this method and URL
    pub(crate) fn authorized_request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let target = TokenTarget::from_url(method.clone(), &url)?;
        let token = self.signer.sign(&target)?;
        debug!(uri = %target.uri(), "signed request");
        Ok(self.http_client.request(method, url).bearer_auth(token))
    }

    /// Send a request and decode a JSON body, keeping transport, status and parse failures apart
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let body = self.send_checked(builder).await?;
        serde_json::from_str(&body).map_err(|err| {
            warn!(error = %err, "response body did not match expected schema");
            OnrampError::Parse(err)
        })
    }

    /// Send a request whose response body is irrelevant
    pub(crate) async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        self.send_checked(builder).await.map(|_| ())
    }

    async fn send_checked(&self, builder: RequestBuilder) -> Result<String> {
        let response = builder.send().await.map_err(|err| {
            warn!(error = %err, "request failed before a response arrived");
            OnrampError::Http(err)
        })?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %body, "provider returned error status");
            return Err(OnrampError::api_error(status, body));
        }
        Ok(body)
    }
}

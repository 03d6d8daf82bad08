/*
[INPUT]:  YAML configuration file, ONRAMP__* environment variables, .env
[OUTPUT]: Parsed demo configuration and adapter-ready settings
[POS]:    Configuration layer - demo setup
[UPDATE]: When adding new configuration options
*/

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use onramp_adapter::auth::credentials::{KEY_ID_ENV, KEY_SECRET_ENV};
use onramp_adapter::{
    Address, CdpCredentials, CheckoutOptions, ClientConfig, ObserverMode, OnrampClient,
    PollerConfig, SessionTokenRequest, WebhookListenerConfig,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};

/// Environment prefix for overrides, e.g. `ONRAMP__STATUS__MODE=webhook`
pub const ENV_PREFIX: &str = "ONRAMP";
const ENV_SEPARATOR: &str = "__";

/// Top-level configuration for the onramp demo
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub api: ApiConfig,
    /// Usually left empty; the CDP_API_KEY_* variables are the normal source
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub checkout: CheckoutConfig,
    #[serde(default)]
    pub status: StatusConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Override for the provider API origin (tests, proxies)
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub key_id: Option<String>,
    #[serde(default, deserialize_with = "optional_secret", skip_serializing)]
    pub key_secret: Option<SecretString>,
}

fn optional_secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).map(SecretString::from))
}

/// Destination wallet the purchased asset is delivered to
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WalletConfig {
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_blockchains")]
    pub blockchains: Vec<String>,
    #[serde(default)]
    pub assets: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckoutConfig {
    /// Hosted widget URL override
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_tracking_prefix")]
    pub tracking_prefix: String,
    #[serde(flatten)]
    pub presets: CheckoutOptions,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            tracking_prefix: default_tracking_prefix(),
            presets: CheckoutOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusConfig {
    #[serde(default)]
    pub mode: ObserverMode,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default)]
    pub webhook: WebhookListenerConfig,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            mode: ObserverMode::default(),
            max_attempts: default_max_attempts(),
            interval_secs: default_interval_secs(),
            webhook: WebhookListenerConfig::default(),
        }
    }
}

impl StatusConfig {
    pub fn poller_config(&self) -> Result<PollerConfig> {
        PollerConfig::new(self.max_attempts, Duration::from_secs(self.interval_secs))
            .context("invalid status polling settings")
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_blockchains() -> Vec<String> {
    vec!["base".to_string()]
}

fn default_tracking_prefix() -> String {
    "demo-user".to_string()
}

fn default_max_attempts() -> u32 {
    PollerConfig::default().max_attempts
}

fn default_interval_secs() -> u64 {
    PollerConfig::default().interval.as_secs()
}

impl DemoConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Optional YAML file layered under `ONRAMP__*` environment overrides.
    /// A `.env` file in the working directory is read first when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(true),
            );
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("wallet.blockchains")
                    .with_list_parse_key("wallet.assets"),
            )
            .build()
            .context("assemble configuration sources")?
            .try_deserialize()
            .context("deserialize configuration")?;

        Ok(config)
    }

    /// Settings every command depends on
    pub fn validate(&self) -> Result<()> {
        self.status.poller_config()?;

        if let Some(base) = &self.api.base_url {
            url::Url::parse(base).with_context(|| format!("invalid api.base_url: {base}"))?;
        }
        if let Some(base) = &self.checkout.base_url {
            url::Url::parse(base).with_context(|| format!("invalid checkout.base_url: {base}"))?;
        }
        if !self.status.webhook.path.starts_with('/') {
            bail!(
                "status.webhook.path must start with '/': {}",
                self.status.webhook.path
            );
        }
        Ok(())
    }

    /// `validate` plus the wallet section, for commands that create checkouts
    pub fn validate_checkout(&self) -> Result<()> {
        self.validate()?;
        self.session_request()
            .validate()
            .context("invalid wallet section")?;
        Ok(())
    }

    pub fn session_request(&self) -> SessionTokenRequest {
        SessionTokenRequest::new(vec![Address::new(
            self.wallet.address.clone(),
            self.wallet.blockchains.iter().cloned(),
        )])
        .with_assets(self.wallet.assets.iter().cloned())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.api.timeout_secs),
            connect_timeout: Duration::from_secs(self.api.connect_timeout_secs),
            ..ClientConfig::default()
        }
    }

    /// Credentials from the config file, falling back to the process environment
    pub fn credentials(&self) -> Result<CdpCredentials> {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    pub fn credentials_with<F>(&self, lookup: F) -> Result<CdpCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = &self.credentials;
        let key_id = file.key_id.clone().filter(|id| !id.trim().is_empty());
        let credentials = match (key_id, &file.key_secret) {
            (Some(key_id), Some(secret)) => CdpCredentials::new(key_id, secret.expose_secret()),
            (Some(key_id), None) => match lookup(KEY_SECRET_ENV) {
                Some(secret) => CdpCredentials::new(key_id, secret),
                None => CdpCredentials::from_lookup(&lookup),
            },
            _ => CdpCredentials::from_lookup(&lookup),
        };
        credentials.with_context(|| format!("API credentials missing; set {KEY_ID_ENV} and {KEY_SECRET_ENV}"))
    }

    pub fn build_client(&self) -> Result<OnrampClient> {
        let credentials = self.credentials()?;
        let client = match &self.api.base_url {
            Some(base) => {
                OnrampClient::with_config_and_base_url(&credentials, self.client_config(), base)
            }
            None => OnrampClient::with_config(&credentials, self.client_config()),
        };
        client.context("create onramp API client")
    }
}

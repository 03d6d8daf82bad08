/*
[INPUT]:  CDP API key identifier and secret (config values or environment)
[OUTPUT]: Validated credential pair with the secret kept out of Debug output
[POS]:    Auth layer - credential intake
[UPDATE]: When credential sources or environment variable names change
*/

use secrecy::{ExposeSecret, SecretString};

use crate::http::{OnrampError, Result};

pub const KEY_ID_ENV: &str = "CDP_API_KEY_ID";
/// Older CDP tooling calls the key identifier its "name"
pub const LEGACY_KEY_NAME_ENV: &str = "CDP_API_KEY_NAME";
pub const KEY_SECRET_ENV: &str = "CDP_API_KEY_SECRET";

/// Key identifier and key secret, supplied out-of-band and never persisted
#[derive(Debug, Clone)]
pub struct CdpCredentials {
    key_id: String,
    key_secret: SecretString,
}

impl CdpCredentials {
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Result<Self> {
        let key_id = key_id.into();
        let key_secret = key_secret.into();

        if key_id.trim().is_empty() {
            return Err(OnrampError::Config("CDP key identifier is empty".to_string()));
        }
        if key_secret.trim().is_empty() {
            return Err(OnrampError::Config("CDP key secret is empty".to_string()));
        }

        Ok(Self {
            key_id: key_id.trim().to_string(),
            key_secret: SecretString::from(key_secret),
        })
    }

    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_id = lookup(KEY_ID_ENV)
            .filter(|value| !value.trim().is_empty())
            .or_else(|| lookup(LEGACY_KEY_NAME_ENV))
            .ok_or_else(|| {
                OnrampError::Config(format!("{KEY_ID_ENV} (or {LEGACY_KEY_NAME_ENV}) is not set"))
            })?;
        let key_secret = lookup(KEY_SECRET_ENV)
            .ok_or_else(|| OnrampError::Config(format!("{KEY_SECRET_ENV} is not set")))?;

        Self::new(key_id, key_secret)
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub(crate) fn expose_secret(&self) -> &str {
        self.key_secret.expose_secret()
    }
}

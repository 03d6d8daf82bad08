/*
[INPUT]:  Session token plus optional widget presets
[OUTPUT]: Hosted checkout URL and caller-side tracking identifiers
[POS]:    Checkout layer - pure URL construction, no network access
[UPDATE]: When the hosted widget gains or renames query parameters
*/

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::http::Result;
use crate::types::{ExperienceMode, SessionToken};

pub const CHECKOUT_BASE_URL: &str = "https://pay.coinbase.com/buy/select-asset";

/// Longest partner user id the provider accepts
pub const MAX_TRACKING_ID_LEN: usize = 49;

/// Optional presets for the hosted widget; every field may be omitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutOptions {
    pub default_network: Option<String>,
    pub default_asset: Option<String>,
    pub preset_fiat_amount: Option<Decimal>,
    pub preset_crypto_amount: Option<Decimal>,
    pub default_experience: Option<ExperienceMode>,
    pub default_payment_method: Option<String>,
    pub fiat_currency: Option<String>,
    pub partner_user_id: Option<String>,
    pub redirect_url: Option<String>,
    pub partner_name: Option<String>,
}

impl CheckoutOptions {
    pub fn with_tracking_id(mut self, tracking_id: &TrackingId) -> Self {
        self.partner_user_id = Some(tracking_id.as_str().to_string());
        self
    }

    /// Query pairs in emission order, skipping absent and blank values
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        push_text(&mut pairs, "defaultNetwork", &self.default_network);
        push_text(&mut pairs, "defaultAsset", &self.default_asset);

        match (self.preset_crypto_amount, self.preset_fiat_amount) {
            (Some(crypto), fiat) => {
                if fiat.is_some() {
                    debug!("crypto amount preset present; dropping fiat amount preset");
                }
                pairs.push(("presetCryptoAmount", crypto.normalize().to_string()));
            }
            (None, Some(fiat)) => pairs.push(("presetFiatAmount", fiat.normalize().to_string())),
            (None, None) => {}
        }

        if let Some(mode) = self.default_experience {
            pairs.push(("defaultExperience", mode.as_str().to_string()));
        }
        push_text(&mut pairs, "defaultPaymentMethod", &self.default_payment_method);
        push_text(&mut pairs, "fiatCurrency", &self.fiat_currency);
        push_text(&mut pairs, "partnerUserId", &self.partner_user_id);
        push_text(&mut pairs, "redirectUrl", &self.redirect_url);
        push_text(&mut pairs, "partnerName", &self.partner_name);

        pairs
    }
}

fn push_text(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: &Option<String>) {
    if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        pairs.push((key, value.to_string()));
    }
}

/// Build the hosted checkout URL. Consumes the session token: it is good for one attempt.
pub fn build_checkout_url(session: SessionToken, options: &CheckoutOptions) -> Result<Url> {
    build_checkout_url_with_base(CHECKOUT_BASE_URL, session, options)
}

pub fn build_checkout_url_with_base(
    base: &str,
    session: SessionToken,
    options: &CheckoutOptions,
) -> Result<Url> {
    let mut url = Url::parse(base)?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("sessionToken", session.as_str());
        for (key, value) in options.query_pairs() {
            query.append_pair(key, &value);
        }
    }
    Ok(url)
}

/// Caller-generated partner user id correlating a checkout with later status queries
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingId(String);

impl TrackingId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// `"{prefix}-{unix_millis}"`, with the prefix shortened to fit the provider cap
    pub fn generate(prefix: &str) -> Self {
        Self::generate_at(prefix, Utc::now())
    }

    pub fn generate_at(prefix: &str, at: DateTime<Utc>) -> Self {
        let suffix = at.timestamp_millis().to_string();
        let room = MAX_TRACKING_ID_LEN.saturating_sub(suffix.len() + 1);
        let prefix = truncate_on_char_boundary(prefix.trim(), room);
        if prefix.is_empty() {
            Self(suffix)
        } else {
            Self(format!("{prefix}-{suffix}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Longest prefix of `value` that fits in `max_bytes` without splitting a character
fn truncate_on_char_boundary(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

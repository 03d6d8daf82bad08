/*
[INPUT]:  Demo configuration, onramp API client, shutdown token
[OUTPUT]: Checkout link (URL + tracking id) and optional status observation
[POS]:    Orchestration layer - session → URL → observe
[UPDATE]: When the demo flow gains or reorders steps
*/

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use onramp_adapter::{
    CHECKOUT_BASE_URL, ObserverMode, OnrampClient, StatusObservation, StatusPoller, TrackingId,
    TransactionStatusObserver, WebhookObserver, build_checkout_url_with_base,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use crate::config::{DemoConfig, StatusConfig};

/// Everything the end user needs to start a purchase
#[derive(Debug, Clone)]
pub struct CheckoutLink {
    pub url: Url,
    pub tracking_id: TrackingId,
}

#[derive(Debug)]
pub struct FlowOutcome {
    pub link: CheckoutLink,
    /// None on dry runs or when interrupted
    pub observation: Option<StatusObservation>,
}

/// Request a session token and turn it into a checkout link
pub async fn create_checkout(client: &OnrampClient, config: &DemoConfig) -> Result<CheckoutLink> {
    let request = config.session_request();
    let session = client
        .create_session_token(&request)
        .await
        .context("request session token")?;

    let tracking_id = TrackingId::generate(&config.checkout.tracking_prefix);
    let options = config.checkout.presets.clone().with_tracking_id(&tracking_id);
    let base = config
        .checkout
        .base_url
        .as_deref()
        .unwrap_or(CHECKOUT_BASE_URL);
    let url = build_checkout_url_with_base(base, session, &options).context("build checkout URL")?;

    info!(tracking_id = %tracking_id, "checkout URL ready");
    Ok(CheckoutLink { url, tracking_id })
}

/// Pick the status strategy named by configuration
pub fn build_observer(
    client: Arc<OnrampClient>,
    status: &StatusConfig,
) -> Result<Box<dyn TransactionStatusObserver>> {
    let observer: Box<dyn TransactionStatusObserver> = match status.mode {
        ObserverMode::Polling => Box::new(StatusPoller::new(client, status.poller_config()?)),
        ObserverMode::Webhook => Box::new(WebhookObserver::new(status.webhook.clone())),
    };
    Ok(observer)
}

/// Observe until done, or give up quietly on shutdown
pub async fn observe_status(
    observer: &dyn TransactionStatusObserver,
    tracking_id: &TrackingId,
    shutdown: &CancellationToken,
) -> Result<Option<StatusObservation>> {
    info!(tracking_id = %tracking_id, mode = ?observer.mode(), "observing transaction status");
    tokio::select! {
        _ = shutdown.cancelled() => {
            warn!(tracking_id = %tracking_id, "status observation interrupted");
            Ok(None)
        }
        result = observer.observe(tracking_id) => {
            let observation = result.context("observe transaction status")?;
            Ok(Some(observation))
        }
    }
}

/// Follow an existing tracking id with whichever strategy `status.mode` names
pub async fn watch_status(
    client: Arc<OnrampClient>,
    status: &StatusConfig,
    tracking_id: &TrackingId,
    shutdown: &CancellationToken,
) -> Result<Option<StatusObservation>> {
    let observer = build_observer(client, status)?;
    observe_status(observer.as_ref(), tracking_id, shutdown).await
}

/// Session, URL, then observation. `on_link` runs as soon as the URL exists,
/// before any status check, so the user can open it while the flow waits.
pub async fn run_checkout_flow(
    client: Arc<OnrampClient>,
    config: &DemoConfig,
    dry_run: bool,
    shutdown: &CancellationToken,
    on_link: impl FnOnce(&CheckoutLink),
) -> Result<FlowOutcome> {
    if shutdown.is_cancelled() {
        bail!("shutdown requested before checkout started");
    }

    let link = create_checkout(&client, config).await?;
    on_link(&link);
    if dry_run {
        info!("dry-run requested; skipping status observation");
        return Ok(FlowOutcome {
            link,
            observation: None,
        });
    }

    let observation = watch_status(client, &config.status, &link.tracking_id, shutdown).await?;
    Ok(FlowOutcome { link, observation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use onramp_adapter::{CdpCredentials, ClientConfig, Ed25519Signer};

    fn offline_client() -> Arc<OnrampClient> {
        let creds = CdpCredentials::new("k", Ed25519Signer::generate().to_key_secret()).unwrap();
        Arc::new(
            OnrampClient::with_config_and_base_url(&creds, ClientConfig::default(), "http://127.0.0.1:9")
                .unwrap(),
        )
    }

    #[test]
    fn test_observer_follows_mode() {
        let mut status = StatusConfig::default();
        let observer = build_observer(offline_client(), &status).unwrap();
        assert_eq!(observer.mode(), ObserverMode::Polling);

        status.mode = ObserverMode::Webhook;
        let observer = build_observer(offline_client(), &status).unwrap();
        assert_eq!(observer.mode(), ObserverMode::Webhook);
    }

    #[test]
    fn test_invalid_poll_budget_rejected() {
        let status = StatusConfig {
            max_attempts: 0,
            ..StatusConfig::default()
        };
        assert!(build_observer(offline_client(), &status).is_err());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let config = DemoConfig::from_yaml_str("wallet:\n  address: \"0xabc\"\n").unwrap();
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let mut shown = false;
        let result = run_checkout_flow(offline_client(), &config, true, &shutdown, |_| shown = true).await;
        assert!(result.is_err());
        assert!(!shown);
    }
}

/*
[INPUT]:  Provider callback requests (raw JSON bodies + signature header)
[OUTPUT]: Acknowledgements, dispatched events, webhook-driven StatusObservation
[POS]:    Status layer - webhook receiving strategy
[UPDATE]: When event kinds, payload fields or listener behaviour change
*/

//! Webhook receiver.
//!
//! Any syntactically valid JSON body is acknowledged with 200, whatever its
//! event type; a body that is not JSON gets 500. The signature header is read
//! and logged but NOT verified: every payload is currently taken as authentic.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{ObserverMode, StatusObservation, TransactionStatusObserver};
use crate::checkout::TrackingId;
use crate::http::{OnrampError, Result};
use crate::types::{TransactionStatus, WebhookEventType};

pub const DEFAULT_WEBHOOK_PATH: &str = "/webhooks/onramp";
pub const SIGNATURE_HEADER: &str = "x-coinbase-signature";

const EVENT_CHANNEL_CAPACITY: usize = 64;
const EVENT_TYPE_KEYS: [&str; 3] = ["eventType", "event_type", "type"];
const PARTNER_USER_KEYS: [&str; 4] = [
    "partnerUserRef",
    "partner_user_ref",
    "partnerUserId",
    "partner_user_id",
];
const TRANSACTION_ID_KEYS: [&str; 2] = ["transactionId", "transaction_id"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventKind {
    Known(WebhookEventType),
    /// Event type present but not one we model
    Other(String),
    /// Valid JSON without any event type field
    Unspecified,
}

/// A parsed callback. Fields are looked up at the top level, then under `data`.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub kind: WebhookEventKind,
    pub partner_user_id: Option<TrackingId>,
    pub transaction_id: Option<String>,
    pub status: Option<TransactionStatus>,
    pub payload: Value,
}

impl WebhookEvent {
    pub fn from_value(payload: Value) -> Self {
        let kind = match lookup_str(&payload, &EVENT_TYPE_KEYS) {
            Some(name) => match WebhookEventType::parse(name) {
                Some(known) => WebhookEventKind::Known(known),
                None => WebhookEventKind::Other(name.to_string()),
            },
            None => WebhookEventKind::Unspecified,
        };
        let partner_user_id = lookup_str(&payload, &PARTNER_USER_KEYS).map(TrackingId::new);
        let transaction_id = lookup_str(&payload, &TRANSACTION_ID_KEYS).map(str::to_string);
        let status = lookup(&payload, &["status"])
            .and_then(|value| serde_json::from_value::<TransactionStatus>(value.clone()).ok());

        Self {
            kind,
            partner_user_id,
            transaction_id,
            status,
            payload,
        }
    }

    /// Explicit status field, else what the event type implies
    pub fn effective_status(&self) -> Option<TransactionStatus> {
        self.status.or(match &self.kind {
            WebhookEventKind::Known(known) => known.implied_status(),
            _ => None,
        })
    }

    pub fn concerns(&self, tracking_id: &TrackingId) -> bool {
        self.partner_user_id.as_ref() == Some(tracking_id)
    }
}

fn lookup<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let scopes = [Some(payload), payload.get("data")];
    scopes
        .into_iter()
        .flatten()
        .find_map(|scope| keys.iter().find_map(|key| scope.get(*key)))
}

fn lookup_str<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a str> {
    lookup(payload, keys).and_then(Value::as_str)
}

#[derive(Clone)]
struct ReceiverState {
    events: broadcast::Sender<WebhookEvent>,
}

/// Router with a single POST route at `path`; parsed events go to `events`
pub fn webhook_router(path: &str, events: broadcast::Sender<WebhookEvent>) -> Router {
    Router::new()
        .route(path, post(receive_webhook))
        .with_state(ReceiverState { events })
}

async fn receive_webhook(
    State(state): State<ReceiverState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) {
        Some(signature) => {
            warn!(signature_len = signature.len(), "webhook signature present but not verified")
        }
        None => warn!("webhook arrived without {SIGNATURE_HEADER} header"),
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            error!(error = %err, bytes = body.len(), "webhook body is not valid JSON");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("invalid JSON payload: {err}") })),
            )
                .into_response();
        }
    };

    let event = WebhookEvent::from_value(payload);
    dispatch(&event);

    // nobody listening is fine in standalone mode
    let _ = state.events.send(event);

    (StatusCode::OK, Json(json!({ "received": true }))).into_response()
}

fn dispatch(event: &WebhookEvent) {
    let partner_user_id = event
        .partner_user_id
        .as_ref()
        .map(TrackingId::as_str)
        .unwrap_or("-");
    let transaction_id = event.transaction_id.as_deref().unwrap_or("-");

    match &event.kind {
        WebhookEventKind::Known(WebhookEventType::TransactionCreated) => {
            info!(partner_user_id, transaction_id, "onramp transaction created")
        }
        WebhookEventKind::Known(WebhookEventType::TransactionCompleted) => {
            info!(partner_user_id, transaction_id, "onramp transaction completed")
        }
        WebhookEventKind::Known(WebhookEventType::TransactionFailed) => {
            warn!(partner_user_id, transaction_id, "onramp transaction failed")
        }
        WebhookEventKind::Known(WebhookEventType::SessionUpdated) => {
            info!(partner_user_id, status = ?event.status, "onramp session updated")
        }
        WebhookEventKind::Other(name) => {
            info!(event_type = %name, partner_user_id, "unhandled webhook event type")
        }
        WebhookEventKind::Unspecified => debug!("webhook payload without event type"),
    }
}

/// Serve `router` on `listener` until `shutdown` fires
pub async fn serve_webhooks(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr = listener
        .local_addr()
        .map_err(|e| OnrampError::Webhook(e.to_string()))?;
    info!(%addr, "webhook listener started");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| OnrampError::Webhook(e.to_string()))?;

    info!(%addr, "webhook listener stopped");
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookListenerConfig {
    pub bind: SocketAddr,
    pub path: String,
    /// How long `observe` waits for a terminal event
    pub timeout_secs: u64,
}

impl Default for WebhookListenerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            path: DEFAULT_WEBHOOK_PATH.to_string(),
            timeout_secs: 300,
        }
    }
}

/// Observes status by running the receiver and waiting for callbacks about one tracking id
pub struct WebhookObserver {
    config: WebhookListenerConfig,
}

impl WebhookObserver {
    pub fn new(config: WebhookListenerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WebhookListenerConfig {
        &self.config
    }

    /// Observe using an already-bound listener
    pub async fn observe_on(
        &self,
        listener: TcpListener,
        tracking_id: &TrackingId,
    ) -> Result<StatusObservation> {
        let (events, mut receiver) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let router = webhook_router(&self.config.path, events);
        let shutdown = CancellationToken::new();
        let server = tokio::spawn(serve_webhooks(listener, router, shutdown.clone()));

        let mut observation = StatusObservation::new(tracking_id, ObserverMode::Webhook);
        let deadline = tokio::time::sleep(Duration::from_secs(self.config.timeout_secs));
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    warn!(tracking_id = %tracking_id, events = observation.attempts, "no terminal webhook before deadline");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) if event.concerns(tracking_id) => {
                        observation.attempts += 1;
                        if let Some(status) = event.effective_status() {
                            observation.last_status = Some(status);
                        }
                        if observation.is_terminal() {
                            info!(tracking_id = %tracking_id, status = ?observation.last_status, "terminal webhook received");
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "webhook observer lagged behind receiver");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        shutdown.cancel();
        server
            .await
            .map_err(|e| OnrampError::Webhook(format!("listener task failed: {e}")))??;
        Ok(observation)
    }
}

#[async_trait]
impl TransactionStatusObserver for WebhookObserver {
    fn mode(&self) -> ObserverMode {
        ObserverMode::Webhook
    }

    async fn observe(&self, tracking_id: &TrackingId) -> Result<StatusObservation> {
        let listener = TcpListener::bind(self.config.bind)
            .await
            .map_err(|e| OnrampError::Webhook(format!("bind {}: {e}", self.config.bind)))?;
        self.observe_on(listener, tracking_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    fn router() -> (Router, broadcast::Receiver<WebhookEvent>) {
        let (tx, rx) = broadcast::channel(8);
        (webhook_router(DEFAULT_WEBHOOK_PATH, tx), rx)
    }

    fn post_body(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(DEFAULT_WEBHOOK_PATH)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_known_event_acknowledged_and_forwarded() {
        let (app, mut rx) = router();
        let response = app
            .oneshot(post_body(
                r#"{"eventType":"onramp.transaction.completed","partnerUserRef":"u-1","transactionId":"tx-9"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"received": true}));

        let event = rx.try_recv().unwrap();
        assert_eq!(
            event.kind,
            WebhookEventKind::Known(WebhookEventType::TransactionCompleted)
        );
        assert_eq!(event.partner_user_id, Some(TrackingId::new("u-1")));
        assert_eq!(event.transaction_id.as_deref(), Some("tx-9"));
        assert_eq!(event.effective_status(), Some(TransactionStatus::Success));
    }

    #[tokio::test]
    async fn test_unknown_event_type_still_acknowledged() {
        let (app, mut rx) = router();
        let response = app
            .oneshot(post_body(r#"{"type":"something.else","data":{}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            rx.try_recv().unwrap().kind,
            WebhookEventKind::Other("something.else".to_string())
        );
    }

    #[tokio::test]
    async fn test_json_without_event_type_acknowledged() {
        let (app, _rx) = router();
        let response = app.oneshot(post_body("[1, 2, 3]")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_json_is_server_error() {
        let (app, mut rx) = router();
        let response = app.oneshot(post_body("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_fields_read_from_data_envelope() {
        let event = WebhookEvent::from_value(json!({
            "event_type": "onramp.session.updated",
            "data": {"partner_user_id": "u-2", "status": "ONRAMP_TRANSACTION_STATUS_IN_PROGRESS"}
        }));
        assert_eq!(
            event.kind,
            WebhookEventKind::Known(WebhookEventType::SessionUpdated)
        );
        assert!(event.concerns(&TrackingId::new("u-2")));
        assert!(!event.concerns(&TrackingId::new("u-3")));
        assert_eq!(event.effective_status(), Some(TransactionStatus::Processing));
    }

    #[tokio::test]
    async fn test_observer_resolves_on_terminal_event() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let observer = WebhookObserver::new(WebhookListenerConfig {
            bind: addr,
            timeout_secs: 10,
            ..WebhookListenerConfig::default()
        });
        let tracking = TrackingId::new("u-42");

        let watch = tokio::spawn(async move { observer.observe_on(listener, &tracking).await });

        let endpoint = format!("http://{addr}{DEFAULT_WEBHOOK_PATH}");
        let http = reqwest::Client::new();
        for body in [
            json!({"eventType": "onramp.transaction.completed", "partnerUserRef": "someone-else"}),
            json!({"eventType": "onramp.transaction.created", "partnerUserRef": "u-42"}),
            json!({"eventType": "onramp.transaction.completed", "partnerUserRef": "u-42"}),
        ] {
            let response = http.post(&endpoint).json(&body).send().await.unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::OK);
        }

        let observation = watch.await.unwrap().unwrap();
        assert_eq!(observation.mode, ObserverMode::Webhook);
        assert_eq!(observation.attempts, 2);
        assert_eq!(observation.last_status, Some(TransactionStatus::Success));
    }

    #[tokio::test]
    async fn test_observer_times_out_without_events() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let observer = WebhookObserver::new(WebhookListenerConfig {
            timeout_secs: 0,
            ..WebhookListenerConfig::default()
        });

        let observation = observer
            .observe_on(listener, &TrackingId::new("u-1"))
            .await
            .unwrap();
        assert_eq!(observation.attempts, 0);
        assert!(!observation.is_terminal());
    }

    #[test]
    fn test_explicit_status_overrides_implied() {
        let event = WebhookEvent::from_value(json!({
            "eventType": "onramp.transaction.created",
            "status": "canceled"
        }));
        assert_eq!(event.effective_status(), Some(TransactionStatus::Canceled));

        let unspecified = WebhookEvent::from_value(json!({"hello": "world"}));
        assert_eq!(unspecified.kind, WebhookEventKind::Unspecified);
        assert_eq!(unspecified.effective_status(), None);
    }
}

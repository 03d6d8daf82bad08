/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public onramp adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod checkout;
pub mod http;
pub mod status;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{CdpCredentials, CdpSigner, Ed25519Signer, Es256Signer, JwtSigner, TokenTarget};

// Re-export checkout URL construction
pub use checkout::{
    CHECKOUT_BASE_URL, CheckoutOptions, TrackingId, build_checkout_url,
    build_checkout_url_with_base,
};

// Re-export commonly used types from http
pub use http::{API_BASE_URL, ClientConfig, OnrampClient, OnrampError, Result};

// Re-export status observation
pub use status::{
    ObserverMode, PollerConfig, StatusObservation, StatusPoller, TransactionSource,
    TransactionStatusObserver, WebhookEvent, WebhookEventKind, WebhookListenerConfig,
    WebhookObserver, serve_webhooks, webhook_router,
};

// Re-export all types
pub use types::*;

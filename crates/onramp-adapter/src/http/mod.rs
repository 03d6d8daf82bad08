/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod session;
pub mod transactions;
pub mod webhooks;

pub use error::{OnrampError, Result};

pub use client::{API_BASE_URL, ClientConfig, OnrampClient};

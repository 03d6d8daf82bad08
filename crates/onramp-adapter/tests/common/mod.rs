/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for onramp-adapter tests

#![allow(dead_code)]

use onramp_adapter::{Address, CdpCredentials, ClientConfig, Ed25519Signer, OnrampClient, SessionTokenRequest};
use wiremock::MockServer;

pub const TEST_KEY_ID: &str = "organizations/org-1/apiKeys/key-1";

/// One P-256 key in legacy SEC1 and PKCS#8 form, plus its public half
pub const P256_SEC1_PEM: &str = include_str!("../fixtures/p256_sec1.pem");
pub const P256_PKCS8_PEM: &str = include_str!("../fixtures/p256_pkcs8.pem");
pub const P256_PUBLIC_PEM: &str = include_str!("../fixtures/p256_public.pem");

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Deterministic signer so tokens can be verified against a known public key
pub fn test_signer() -> Ed25519Signer {
    Ed25519Signer::from_secret_key(&[7u8; 32])
}

pub fn test_credentials() -> CdpCredentials {
    CdpCredentials::new(TEST_KEY_ID, test_signer().to_key_secret()).expect("test credentials")
}

pub fn client_for(server: &MockServer) -> OnrampClient {
    OnrampClient::with_config_and_base_url(&test_credentials(), ClientConfig::default(), &server.uri())
        .expect("client init")
}

pub fn base_session_request() -> SessionTokenRequest {
    SessionTokenRequest::new(vec![Address::new(
        "0x4315d134aCd3221a02dD380ADE3aF39Ce219037c",
        ["base", "ethereum"],
    )])
    .with_assets(["USDC"])
}

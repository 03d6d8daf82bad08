/*
[INPUT]:  CDP API key identifier and secret
[OUTPUT]: Per-request JWTs and signing errors
[POS]:    Auth layer - handles provider API authentication
[UPDATE]: When auth flow or signature methods change
*/

pub mod credentials;
pub mod jwt;
pub mod signer;

pub use credentials::CdpCredentials;
pub use jwt::{JwtClaims, JwtHeader, JwtSigner, TokenTarget, decode_claims, decode_header};
pub use signer::{CdpSigner, Ed25519Signer, Es256Signer};

/*
[INPUT]:  Message bytes and CDP key secret material (Ed25519 base64 or P-256 PEM)
[OUTPUT]: EdDSA or ES256 signatures over JWT signing input
[POS]:    Auth layer - cryptographic signing for request authentication
[UPDATE]: When changing signing algorithm or key format
*/

use std::fmt;

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD},
};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use jsonwebtoken::{Algorithm, EncodingKey};
use rand::rngs::OsRng;

use crate::http::{OnrampError, Result};

const PEM_PREFIX: &str = "-----BEGIN";
const SEC1_LABEL: &str = "EC PRIVATE KEY";
const PKCS8_LABEL: &str = "PRIVATE KEY";

/// AlgorithmIdentifier for id-ecPublicKey on prime256v1
const P256_ALGORITHM_ID: [u8; 21] = [
    0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08, 0x2a, 0x86,
    0x48, 0xce, 0x3d, 0x03, 0x01, 0x07,
];

/// Whichever key type the CDP secret turned out to be
#[derive(Debug)]
pub enum CdpSigner {
    Ed25519(Ed25519Signer),
    Es256(Es256Signer),
}

impl CdpSigner {
    /// PEM secrets are legacy ECDSA keys, anything else is an Ed25519 secret.
    pub fn from_key_secret(secret: &str) -> Result<Self> {
        if secret.trim_start().starts_with(PEM_PREFIX) {
            Es256Signer::from_pem(secret).map(Self::Es256)
        } else {
            Ed25519Signer::from_key_secret(secret).map(Self::Ed25519)
        }
    }

    /// JOSE `alg` value for tokens signed with this key
    pub fn algorithm(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => "EdDSA",
            Self::Es256(_) => "ES256",
        }
    }

    /// Sign and return the base64url signature segment
    pub fn sign_segment(&self, message: &[u8]) -> Result<String> {
        match self {
            Self::Ed25519(signer) => Ok(URL_SAFE_NO_PAD.encode(signer.sign(message).to_bytes())),
            Self::Es256(signer) => signer.sign_segment(message),
        }
    }
}

impl From<Ed25519Signer> for CdpSigner {
    fn from(signer: Ed25519Signer) -> Self {
        Self::Ed25519(signer)
    }
}

impl From<Es256Signer> for CdpSigner {
    fn from(signer: Es256Signer) -> Self {
        Self::Es256(signer)
    }
}

/// ECDSA P-256 signer for legacy PEM API keys
pub struct Es256Signer {
    encoding_key: EncodingKey,
}

impl fmt::Debug for Es256Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Es256Signer").finish_non_exhaustive()
    }
}

impl Es256Signer {
    /// Parse a SEC1 (`EC PRIVATE KEY`) or PKCS#8 (`PRIVATE KEY`) PEM.
    ///
    /// Secrets copied from env files often carry literal `\n` instead of
    /// line breaks; both forms are accepted.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let pem = pem.trim().replace("\\n", "\n");

        let encoding_key = if let Some(sec1) = pem_der(&pem, SEC1_LABEL)? {
            EncodingKey::from_ec_der(&sec1_to_pkcs8(&sec1)?)
        } else if pem_der(&pem, PKCS8_LABEL)?.is_some() {
            EncodingKey::from_ec_pem(pem.as_bytes())
                .map_err(|e| OnrampError::Config(format!("invalid EC private key: {e}")))?
        } else {
            return Err(OnrampError::Config(
                "PEM key secret must be an EC PRIVATE KEY or PRIVATE KEY block".to_string(),
            ));
        };

        // ring only parses the key material when signing
        jsonwebtoken::crypto::sign(b"cdp", &encoding_key, Algorithm::ES256)
            .map_err(|e| OnrampError::Config(format!("invalid EC private key: {e}")))?;

        Ok(Self { encoding_key })
    }

    /// Fixed-width r||s signature, base64url encoded
    pub fn sign_segment(&self, message: &[u8]) -> Result<String> {
        jsonwebtoken::crypto::sign(message, &self.encoding_key, Algorithm::ES256)
            .map_err(|e| OnrampError::Signing(format!("ES256 signing failed: {e}")))
    }
}

/// DER body of the first PEM block with `label`, if there is one
fn pem_der(pem: &str, label: &str) -> Result<Option<Vec<u8>>> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");
    let Some(start) = pem.find(&begin) else {
        return Ok(None);
    };
    let body = &pem[start + begin.len()..];
    let Some(stop) = body.find(&end) else {
        return Err(OnrampError::Config(format!("PEM block {label} is not terminated")));
    };

    let encoded: String = body[..stop].split_whitespace().collect();
    if encoded.is_empty() {
        return Err(OnrampError::Config(format!("PEM block {label} is empty")));
    }
    let der = BASE64
        .decode(encoded)
        .map_err(|e| OnrampError::Config(format!("PEM block {label} is not valid base64: {e}")))?;
    Ok(Some(der))
}

/// Wrap a SEC1 ECPrivateKey in a PKCS#8 PrivateKeyInfo for P-256
fn sec1_to_pkcs8(sec1: &[u8]) -> Result<Vec<u8>> {
    if sec1.len() > u16::MAX as usize / 2 {
        return Err(OnrampError::Config("EC private key is too large".to_string()));
    }

    let mut info = vec![0x02, 0x01, 0x00];
    info.extend_from_slice(&P256_ALGORITHM_ID);
    info.push(0x04);
    push_der_len(&mut info, sec1.len());
    info.extend_from_slice(sec1);

    let mut der = vec![0x30];
    push_der_len(&mut der, info.len());
    der.extend(info);
    Ok(der)
}

fn push_der_len(out: &mut Vec<u8>, len: usize) {
    match len {
        0..=0x7f => out.push(len as u8),
        0x80..=0xff => out.extend([0x81, len as u8]),
        _ => out.extend([0x82, (len >> 8) as u8, len as u8]),
    }
}

/// Ed25519 signer for request authentication
#[derive(Debug)]
pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl Ed25519Signer {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create signer from existing secret key bytes (32 bytes)
    pub fn from_secret_key(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        Self { signing_key }
    }

    /// Parse a CDP key secret.
    ///
    /// Accepts base64 of either the 64-byte keypair (seed followed by public key)
    /// that CDP issues, or a bare 32-byte seed.
    pub fn from_key_secret(secret: &str) -> Result<Self> {
        let secret = secret.trim();
        if secret.starts_with("-----BEGIN") {
            return Err(OnrampError::Config(
                "PEM key given where an Ed25519 secret was expected".to_string(),
            ));
        }

        let bytes = BASE64
            .decode(secret)
            .map_err(|e| OnrampError::Config(format!("key secret is not valid base64: {e}")))?;

        match bytes.len() {
            32 => {
                let mut seed = [0u8; 32];
                seed.copy_from_slice(&bytes);
                Ok(Self::from_secret_key(&seed))
            }
            64 => {
                let mut keypair = [0u8; 64];
                keypair.copy_from_slice(&bytes);
                let signing_key = SigningKey::from_keypair_bytes(&keypair)
                    .map_err(|e| OnrampError::Signing(format!("inconsistent Ed25519 keypair: {e}")))?;
                Ok(Self { signing_key })
            }
            other => Err(OnrampError::Config(format!(
                "key secret must decode to 32 or 64 bytes, got {other}"
            ))),
        }
    }

    /// Sign a message and return the signature
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Get the raw public key bytes
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Base64 of seed followed by public key, the layout CDP hands out
    pub fn to_key_secret(&self) -> String {
        BASE64.encode(self.signing_key.to_keypair_bytes())
    }

    /// Verify a signature against a message
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.signing_key
            .verifying_key()
            .verify(message, signature)
            .is_ok()
    }
}

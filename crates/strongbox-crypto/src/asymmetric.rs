//! RSA key pairs and RSA-OAEP encryption of short strings
//!
//! Plaintext is UTF-8 encoded, then base64 encoded, then encrypted in one
//! RSA operation (no chunking). The caller keeps the input within the key's
//! OAEP payload limit. Ciphertext is bare lowercase hex.
//!
//! Keys are PEM: public keys as SubjectPublicKeyInfo (`BEGIN PUBLIC KEY`),
//! private keys as PKCS#1 (`BEGIN RSA PRIVATE KEY`).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CodecError, CodecResult};

/// A freshly generated RSA key pair, both halves PEM-encoded and trimmed.
///
/// The private half is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    pub public_key: String,
    pub private_key: String,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

fn asymmetric_err(e: impl std::fmt::Display) -> CodecError {
    CodecError::AsymmetricOperationFailed(e.to_string())
}

fn padding() -> Oaep {
    Oaep::new::<Sha1>()
}

/// Generate an RSA key pair with a `bits`-bit modulus.
///
/// Runs on the blocking thread pool: large moduli take seconds to generate.
pub async fn generate_key_pair(bits: usize) -> CodecResult<KeyPair> {
    debug!(bits, "generating RSA key pair");
    tokio::task::spawn_blocking(move || generate_key_pair_blocking(bits))
        .await
        .map_err(|e| CodecError::KeyPairGenerationFailed(e.to_string()))?
}

fn generate_key_pair_blocking(bits: usize) -> CodecResult<KeyPair> {
    let keygen_err = |e: &dyn std::fmt::Display| CodecError::KeyPairGenerationFailed(e.to_string());

    let private = RsaPrivateKey::new(&mut rand::thread_rng(), bits).map_err(|e| keygen_err(&e))?;
    let public = RsaPublicKey::from(&private);

    let private_pem = private
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| keygen_err(&e))?;
    let public_pem = public
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| keygen_err(&e))?;

    Ok(KeyPair {
        public_key: public_pem.trim().to_string(),
        private_key: private_pem.trim().to_string(),
    })
}

fn parse_public_key(pem: &str) -> CodecResult<RsaPublicKey> {
    let pem = pem.trim();
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(asymmetric_err)
}

fn parse_private_key(pem: &str) -> CodecResult<RsaPrivateKey> {
    let pem = pem.trim();
    RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(asymmetric_err)
}

/// Encrypt `input` to the holder of `public_key_pem`. Returns lowercase hex.
pub async fn asymmetric_encrypt(input: &str, public_key_pem: &str) -> CodecResult<String> {
    let public = parse_public_key(public_key_pem)?;
    let encoded = STANDARD.encode(input.as_bytes());
    debug!(payload_len = encoded.len(), "RSA encrypt");

    let ciphertext = public
        .encrypt(&mut rand::thread_rng(), padding(), encoded.as_bytes())
        .map_err(asymmetric_err)?;
    Ok(hex::encode(ciphertext))
}

/// Decrypt hex ciphertext from [`asymmetric_encrypt`] with the matching private key.
pub async fn asymmetric_decrypt(ciphertext_hex: &str, private_key_pem: &str) -> CodecResult<String> {
    let private = parse_private_key(private_key_pem)?;
    let ciphertext = hex::decode(ciphertext_hex.trim()).map_err(asymmetric_err)?;
    debug!(ciphertext_len = ciphertext.len(), "RSA decrypt");

    let mut encoded = private
        .decrypt(padding(), &ciphertext)
        .map_err(asymmetric_err)?;
    let decoded = STANDARD.decode(&encoded).map_err(asymmetric_err);
    encoded.zeroize();

    String::from_utf8(decoded?).map_err(asymmetric_err)
}

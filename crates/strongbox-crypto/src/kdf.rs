//! Key derivation: PBKDF2-HMAC-SHA256 password → symmetric key

use hmac::Hmac;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroize;

use crate::error::{CodecError, CodecResult};
use crate::KEY_SIZE;

/// PBKDF2 iteration count. Part of the key format: changing it changes every
/// derived key.
pub const PBKDF2_ITERATIONS: u32 = 2000;

/// A 256-bit symmetric key.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Parse a 64-character hex key.
    pub fn from_hex(hex_key: &str) -> CodecResult<Self> {
        let mut decoded = hex::decode(hex_key)
            .map_err(|e| CodecError::InvalidKey(format!("not hex: {e}")))?;
        if decoded.len() != KEY_SIZE {
            let len = decoded.len();
            decoded.zeroize();
            return Err(CodecError::InvalidKey(format!(
                "expected {KEY_SIZE} bytes, got {len}"
            )));
        }

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a 256-bit key from a password and salt, returned as lowercase hex.
///
/// Deterministic: the same password and salt always give the same key.
pub async fn derive_key(password: &SecretString, salt: &str) -> CodecResult<String> {
    let key = derive_symmetric_key(password, salt)?;
    Ok(key.to_hex())
}

/// Like [`derive_key`], returning the key itself rather than its hex form.
pub fn derive_symmetric_key(password: &SecretString, salt: &str) -> CodecResult<SymmetricKey> {
    debug!(
        iterations = PBKDF2_ITERATIONS,
        salt_len = salt.len(),
        "deriving key"
    );

    let mut key = [0u8; KEY_SIZE];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(
        password.expose_secret().as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut key,
    )
    .map_err(|e| CodecError::KeyDerivationFailed(e.to_string()))?;

    Ok(SymmetricKey::from_bytes(key))
}

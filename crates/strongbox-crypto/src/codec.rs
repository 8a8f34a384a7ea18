//! Config-bound entry point for all codec operations

use secrecy::SecretString;

use crate::asymmetric::{self, KeyPair};
use crate::config::{ChunkSize, CodecConfig};
use crate::error::CodecResult;
use crate::symmetric::{self, Plaintext};
use crate::{digest, kdf, random};

/// Codec operations with defaults taken from a [`CodecConfig`].
///
/// Holds no per-call state: a single `Codec` can serve any number of
/// concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    pub fn new(config: CodecConfig) -> CodecResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn chunk(&self, requested: Option<usize>) -> CodecResult<usize> {
        ChunkSize::resolve(requested, self.config.chunk_size).map(ChunkSize::get)
    }

    pub async fn derive_key(&self, password: &SecretString, salt: &str) -> CodecResult<String> {
        kdf::derive_key(password, salt).await
    }

    /// Generate a key pair of `bits`, or of the configured size when `None`.
    pub async fn generate_key_pair(&self, bits: Option<usize>) -> CodecResult<KeyPair> {
        asymmetric::generate_key_pair(bits.unwrap_or(self.config.key_bits)).await
    }

    pub async fn random_bytes(&self, length: usize) -> CodecResult<String> {
        random::random_bytes(length).await
    }

    pub async fn encrypt<'a>(
        &self,
        input: impl Into<Plaintext<'a>>,
        key: &str,
        encode_as_utf8: bool,
        chunk_size: Option<usize>,
    ) -> CodecResult<String> {
        let chunk = self.chunk(chunk_size)?;
        symmetric::encrypt(input, key, encode_as_utf8, Some(chunk)).await
    }

    pub async fn decrypt(
        &self,
        envelope: &str,
        key: &str,
        decode_as_utf8: bool,
        chunk_size: Option<usize>,
    ) -> CodecResult<String> {
        let chunk = self.chunk(chunk_size)?;
        symmetric::decrypt(envelope, key, decode_as_utf8, Some(chunk)).await
    }

    pub async fn decrypt_binary(
        &self,
        envelope: &str,
        key: &str,
        chunk_size: Option<usize>,
    ) -> CodecResult<Vec<u8>> {
        let chunk = self.chunk(chunk_size)?;
        symmetric::decrypt_binary(envelope, key, Some(chunk)).await
    }

    pub async fn asymmetric_encrypt(&self, input: &str, public_key_pem: &str) -> CodecResult<String> {
        asymmetric::asymmetric_encrypt(input, public_key_pem).await
    }

    pub async fn asymmetric_decrypt(
        &self,
        ciphertext_hex: &str,
        private_key_pem: &str,
    ) -> CodecResult<String> {
        asymmetric::asymmetric_decrypt(ciphertext_hex, private_key_pem).await
    }

    pub async fn digest(&self, input: &str, chunk_size: Option<usize>) -> CodecResult<String> {
        let chunk = self.chunk(chunk_size)?;
        digest::digest(input, Some(chunk)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;

    #[test]
    fn rejects_invalid_config() {
        let config = CodecConfig {
            chunk_size: 0,
            ..CodecConfig::default()
        };
        assert!(matches!(
            Codec::new(config),
            Err(CodecError::InvalidChunkSize(0))
        ));
    }

    #[tokio::test]
    async fn configured_chunk_size_is_used_by_default() {
        let codec = Codec::new(CodecConfig {
            chunk_size: 3,
            ..CodecConfig::default()
        })
        .unwrap();
        let key = codec.random_bytes(32).await.unwrap();

        let env = codec.encrypt("chunked by three", &key, true, None).await.unwrap();
        assert_eq!(
            codec.decrypt(&env, &key, true, None).await.unwrap(),
            "chunked by three"
        );
    }

    #[tokio::test]
    async fn explicit_zero_still_rejected() {
        let codec = Codec::default();
        let err = codec.digest("x", Some(0)).await.unwrap_err();
        assert!(matches!(err, CodecError::InvalidChunkSize(0)));
    }
}

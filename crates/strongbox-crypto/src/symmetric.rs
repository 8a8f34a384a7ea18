//! Chunked AES-256-CBC encryption into the `AES-CBC:<iv>:<ciphertext>` envelope
//!
//! Encryption:
//! ```text
//! text ─(optional: UTF-8 → base64)─▶ slices ─▶ CBC update ... ─▶ PKCS#7 finalize ─▶ envelope
//! ```
//!
//! Decryption streams the ciphertext hex `2 * chunk_size` characters at a
//! time, so `chunk_size` is a byte count on both sides. The decryptor keeps
//! the last ciphertext block back until finalize, where padding is checked.

use aes::Aes256;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use tracing::debug;

use crate::config::{ChunkSize, DEFAULT_CHUNK_SIZE};
use crate::envelope::{CipherAlgorithm, Envelope};
use crate::error::{CodecError, CodecResult};
use crate::kdf::SymmetricKey;
use crate::random::fill_random;
use crate::stream::{byte_slices, char_slices, drive, Incremental};
use crate::{BLOCK_SIZE, IV_SIZE};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Input to [`encrypt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plaintext<'a> {
    /// Text, chunked by characters.
    Text(&'a str),
    /// Raw bytes, chunked by bytes. Never pre-encoded.
    Binary(&'a [u8]),
}

impl<'a> From<&'a str> for Plaintext<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for Plaintext<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a [u8]> for Plaintext<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Binary(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for Plaintext<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

/// Encrypt `input` under a hex key into a fresh envelope.
///
/// With `encode_as_utf8`, text input is UTF-8 encoded and then base64 encoded
/// before encryption; [`decrypt`] must be called with the same flag. Binary
/// input is always encrypted as-is. Every call draws a new random IV.
pub async fn encrypt<'a>(
    input: impl Into<Plaintext<'a>>,
    key: &str,
    encode_as_utf8: bool,
    chunk_size: Option<usize>,
) -> CodecResult<String> {
    let chunk = ChunkSize::resolve(chunk_size, DEFAULT_CHUNK_SIZE)?;
    let key = SymmetricKey::from_hex(key)?;

    let mut iv = [0u8; IV_SIZE];
    fill_random(&mut iv)?;

    encrypt_with_iv(input.into(), &key, &iv, encode_as_utf8, chunk).await
}

pub(crate) async fn encrypt_with_iv(
    input: Plaintext<'_>,
    key: &SymmetricKey,
    iv: &[u8; IV_SIZE],
    encode_as_utf8: bool,
    chunk: ChunkSize,
) -> CodecResult<String> {
    let algorithm = CipherAlgorithm::AesCbc;
    let state = CbcEncryptStream::new(key, iv)?;

    let ciphertext = match input {
        Plaintext::Text(text) if encode_as_utf8 => {
            let encoded = STANDARD.encode(text.as_bytes());
            debug!(%algorithm, input_len = encoded.len(), chunk = chunk.get(), "encrypting base64 text");
            drive(state, byte_slices(encoded.as_bytes(), chunk)).await?
        }
        Plaintext::Text(text) => {
            debug!(%algorithm, input_len = text.len(), chunk = chunk.get(), "encrypting raw text");
            drive(state, char_slices(text, chunk)).await?
        }
        Plaintext::Binary(bytes) => {
            debug!(%algorithm, input_len = bytes.len(), chunk = chunk.get(), "encrypting binary");
            drive(state, byte_slices(bytes, chunk)).await?
        }
    };

    Ok(Envelope::format(algorithm, iv, &ciphertext))
}

/// Decrypt an envelope to text.
///
/// `decode_as_utf8` must match the `encode_as_utf8` flag used to encrypt.
/// Plaintext that does not decode (bad base64 or invalid UTF-8) means the key
/// and ciphertext disagree, reported as
/// [`CodecError::SymmetricDecryptionFailed`].
pub async fn decrypt(
    envelope: &str,
    key: &str,
    decode_as_utf8: bool,
    chunk_size: Option<usize>,
) -> CodecResult<String> {
    let plaintext = decrypt_binary(envelope, key, chunk_size).await?;

    let text_bytes = if decode_as_utf8 {
        STANDARD
            .decode(&plaintext)
            .map_err(|_| CodecError::SymmetricDecryptionFailed)?
    } else {
        plaintext
    };

    String::from_utf8(text_bytes).map_err(|_| CodecError::SymmetricDecryptionFailed)
}

/// Decrypt an envelope to the raw plaintext bytes.
pub async fn decrypt_binary(
    envelope: &str,
    key: &str,
    chunk_size: Option<usize>,
) -> CodecResult<Vec<u8>> {
    let chunk = ChunkSize::resolve(chunk_size, DEFAULT_CHUNK_SIZE)?;
    let envelope = Envelope::parse(envelope)?;
    let key = SymmetricKey::from_hex(key)?;
    decrypt_envelope(&envelope, &key, chunk).await
}

pub(crate) async fn decrypt_envelope(
    envelope: &Envelope<'_>,
    key: &SymmetricKey,
    chunk: ChunkSize,
) -> CodecResult<Vec<u8>> {
    let state = match envelope.algorithm {
        CipherAlgorithm::AesCbc => CbcDecryptStream::new(key, &envelope.iv)?,
    };

    // chunk is in plaintext bytes; each byte is two hex characters
    let hex_chunk = ChunkSize::new(chunk.get().saturating_mul(2))?;
    debug!(
        algorithm = %envelope.algorithm,
        ciphertext_hex_len = envelope.ciphertext_hex.len(),
        chunk = chunk.get(),
        "decrypting"
    );
    drive(state, byte_slices(envelope.ciphertext_hex.as_bytes(), hex_chunk)).await
}

/// Streaming CBC encryptor. Whole blocks are encrypted as soon as they are
/// available; a partial block waits in `pending` for more input or finalize.
struct CbcEncryptStream {
    cipher: Aes256CbcEnc,
    pending: Vec<u8>,
    out: Vec<u8>,
}

impl CbcEncryptStream {
    fn new(key: &SymmetricKey, iv: &[u8]) -> CodecResult<Self> {
        let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), iv)
            .map_err(|e| CodecError::InvalidKey(e.to_string()))?;
        Ok(Self {
            cipher,
            pending: Vec::with_capacity(BLOCK_SIZE),
            out: Vec::new(),
        })
    }
}

impl Incremental for CbcEncryptStream {
    type Output = Vec<u8>;

    fn update(&mut self, slice: &[u8]) -> CodecResult<()> {
        self.pending.extend_from_slice(slice);
        let ready = self.pending.len() - self.pending.len() % BLOCK_SIZE;
        if ready == 0 {
            return Ok(());
        }

        let start = self.out.len();
        self.out.extend(self.pending.drain(..ready));
        for block in self.out[start..].chunks_exact_mut(BLOCK_SIZE) {
            self.cipher
                .encrypt_block_mut(aes::Block::from_mut_slice(block));
        }
        Ok(())
    }

    fn finalize(self) -> CodecResult<Vec<u8>> {
        let Self {
            cipher,
            pending,
            mut out,
        } = self;
        // pending is always shorter than one block here
        out.extend(cipher.encrypt_padded_vec_mut::<Pkcs7>(&pending));
        Ok(out)
    }
}

/// Streaming CBC decryptor over hex-encoded ciphertext slices.
///
/// The final block is never decrypted in `update`: it carries the padding,
/// and only finalize knows it is the last one.
struct CbcDecryptStream {
    cipher: Aes256CbcDec,
    pending: Vec<u8>,
    out: Vec<u8>,
}

impl CbcDecryptStream {
    fn new(key: &SymmetricKey, iv: &[u8]) -> CodecResult<Self> {
        let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
            .map_err(|e| CodecError::InvalidKey(e.to_string()))?;
        Ok(Self {
            cipher,
            pending: Vec::with_capacity(2 * BLOCK_SIZE),
            out: Vec::new(),
        })
    }
}

impl Incremental for CbcDecryptStream {
    type Output = Vec<u8>;

    fn update(&mut self, hex_slice: &[u8]) -> CodecResult<()> {
        let bytes = hex::decode(hex_slice).map_err(|_| CodecError::MalformedEnvelope)?;
        self.pending.extend_from_slice(&bytes);
        if self.pending.len() <= BLOCK_SIZE {
            return Ok(());
        }

        // everything but the last (possibly partial) block
        let ready = (self.pending.len() - 1) / BLOCK_SIZE * BLOCK_SIZE;
        let start = self.out.len();
        self.out.extend(self.pending.drain(..ready));
        for block in self.out[start..].chunks_exact_mut(BLOCK_SIZE) {
            self.cipher
                .decrypt_block_mut(aes::Block::from_mut_slice(block));
        }
        Ok(())
    }

    fn finalize(self) -> CodecResult<Vec<u8>> {
        let Self {
            cipher,
            pending,
            mut out,
        } = self;
        let tail = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&pending)
            .map_err(|_| CodecError::SymmetricDecryptionFailed)?;
        out.extend(tail);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "12d4a9c1f07e35b86d2c94e0a1b7f35c8e6d20a4f9b13c57e08d6a2f4cdbc337";
    const TEXT: &str = "FooBar ^& 123 łąć 🦫";

    fn fixed_key() -> SymmetricKey {
        let bytes: Vec<u8> = (0u8..32).collect();
        SymmetricKey::from_bytes(bytes.try_into().unwrap())
    }

    fn fixed_iv() -> [u8; IV_SIZE] {
        let bytes: Vec<u8> = (0u8..16).collect();
        bytes.try_into().unwrap()
    }

    fn chunk(n: usize) -> ChunkSize {
        ChunkSize::new(n).unwrap()
    }

    fn ciphertext_of(envelope: &str) -> &str {
        envelope.rsplit(':').next().unwrap()
    }

    #[tokio::test]
    async fn test_known_vector_any_chunking() {
        let expected = "4846f83aa211e239aa62a21f527f089ee9ddbead30ee15d4e79b607a621b97be\
                        038b06d28923c94bca2c60df36761146";
        for n in [1, 5, 16, 17, 65536] {
            let env = encrypt_with_iv(
                Plaintext::Text("The quick brown fox jumps over the lazy dog"),
                &fixed_key(),
                &fixed_iv(),
                false,
                chunk(n),
            )
            .await
            .unwrap();
            assert_eq!(ciphertext_of(&env), expected, "chunk size {n}");
        }
    }

    #[tokio::test]
    async fn test_empty_input_is_one_padding_block() {
        let env = encrypt_with_iv(
            Plaintext::Binary(b""),
            &fixed_key(),
            &fixed_iv(),
            false,
            chunk(4),
        )
        .await
        .unwrap();
        assert_eq!(ciphertext_of(&env), "e9c3ef8ab23453e6f0749cd636e7a88e");
    }

    #[tokio::test]
    async fn test_block_aligned_input_gets_full_padding_block() {
        let env = encrypt_with_iv(
            Plaintext::Binary(b"0123456789abcdef"),
            &fixed_key(),
            &fixed_iv(),
            false,
            chunk(3),
        )
        .await
        .unwrap();
        assert_eq!(
            ciphertext_of(&env),
            "e23fc0b91c7bd64425c559736e9b0c58485ec1d6a71e615932325d6506ec3700"
        );
    }

    #[tokio::test]
    async fn test_text_roundtrip_utf8() {
        let env = encrypt(TEXT, KEY, true, None).await.unwrap();
        let mut fields = env.split(':');
        assert_eq!(fields.next(), Some("AES-CBC"));
        let iv = fields.next().unwrap();
        let ct = fields.next().unwrap();
        assert_eq!(iv.len(), 32);
        assert!(iv.chars().chain(ct.chars()).all(|c| matches!(c, '0'..='9' | 'a'..='f')));

        assert_eq!(decrypt(&env, KEY, true, None).await.unwrap(), TEXT);
    }

    #[tokio::test]
    async fn test_text_roundtrip_raw() {
        let env = encrypt(TEXT, KEY, false, Some(3)).await.unwrap();
        assert_eq!(decrypt(&env, KEY, false, Some(7)).await.unwrap(), TEXT);
    }

    #[tokio::test]
    async fn test_binary_roundtrip() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let env = encrypt(&data, KEY, true, Some(64)).await.unwrap();
        assert_eq!(decrypt_binary(&env, KEY, Some(64)).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_fresh_iv_per_call() {
        let a = encrypt(TEXT, KEY, true, None).await.unwrap();
        let b = encrypt(TEXT, KEY, true, None).await.unwrap();
        assert_ne!(a, b);
        assert_ne!(a.split(':').nth(1), b.split(':').nth(1));
    }

    #[tokio::test]
    async fn test_wrong_key_fails() {
        let env = encrypt(TEXT, KEY, true, None).await.unwrap();
        let other = "00".repeat(32);
        let err = decrypt(&env, &other, true, None).await.unwrap_err();
        assert!(matches!(err, CodecError::SymmetricDecryptionFailed));
    }

    #[tokio::test]
    async fn test_truncated_ciphertext_fails_padding() {
        let env = encrypt("sixteen byte msg plus more", KEY, false, None).await.unwrap();
        // drop the last byte: no longer a whole number of blocks
        let truncated = &env[..env.len() - 2];
        let err = decrypt_binary(truncated, KEY, None).await.unwrap_err();
        assert!(matches!(err, CodecError::SymmetricDecryptionFailed));
    }

    #[tokio::test]
    async fn test_non_hex_ciphertext_is_malformed() {
        let env = format!("AES-CBC:{}:zz00", "00".repeat(16));
        let err = decrypt_binary(&env, KEY, None).await.unwrap_err();
        assert!(matches!(err, CodecError::MalformedEnvelope));
    }

    #[tokio::test]
    async fn test_zero_chunk_size_rejected() {
        let err = encrypt(TEXT, KEY, true, Some(0)).await.unwrap_err();
        assert!(matches!(err, CodecError::InvalidChunkSize(0)));

        let env = encrypt(TEXT, KEY, true, None).await.unwrap();
        let err = decrypt(&env, KEY, true, Some(0)).await.unwrap_err();
        assert!(matches!(err, CodecError::InvalidChunkSize(0)));
    }

    #[tokio::test]
    async fn test_chunk_size_checked_before_envelope() {
        let err = decrypt("garbage", KEY, true, Some(0)).await.unwrap_err();
        assert!(matches!(err, CodecError::InvalidChunkSize(0)));
    }

    #[tokio::test]
    async fn test_bad_key_rejected() {
        let err = encrypt(TEXT, "abcd", true, None).await.unwrap_err();
        assert!(matches!(err, CodecError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_mismatched_utf8_flag_fails() {
        // raw text containing ':' and spaces is not valid base64
        let env = encrypt("not: base64!", KEY, false, None).await.unwrap();
        let err = decrypt(&env, KEY, true, None).await.unwrap_err();
        assert!(matches!(err, CodecError::SymmetricDecryptionFailed));
    }
}

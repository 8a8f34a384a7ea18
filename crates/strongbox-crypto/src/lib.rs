//! strongbox-crypto: client-side codec for strongbox
//!
//! Operations:
//! ```text
//! derive_key        password + salt ─PBKDF2-HMAC-SHA256(2000)─▶ 64-hex key
//! generate_key_pair bits ─▶ (SPKI public PEM, PKCS#1 private PEM)
//! random_bytes      n ─▶ 2n hex chars
//! encrypt           text | bytes ─AES-256-CBC, chunked─▶ "AES-CBC:<iv>:<ciphertext>"
//! decrypt           envelope ─▶ text | bytes
//! asymmetric_*      short text ⇄ RSA-OAEP hex
//! digest            text ─SHA-256, chunked─▶ 64-hex digest
//! ```
//!
//! Large inputs are fed to the cipher or hash in bounded chunks with a
//! cooperative yield between chunks. Chunk size is a throughput knob only:
//! output never depends on it.
//!
//! Every operation is `async` and reports all failures, including argument
//! validation, through [`CodecError`].

pub mod asymmetric;
pub mod codec;
pub mod config;
pub mod digest;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod random;
mod stream;
pub mod symmetric;

pub use asymmetric::{asymmetric_decrypt, asymmetric_encrypt, generate_key_pair, KeyPair};
pub use codec::Codec;
pub use config::{ChunkSize, CodecConfig, DEFAULT_CHUNK_SIZE, DEFAULT_KEY_BITS};
pub use digest::digest;
pub use envelope::{CipherAlgorithm, Envelope};
pub use error::{CodecError, CodecResult, ErrorKind};
pub use kdf::{derive_key, derive_symmetric_key, SymmetricKey, PBKDF2_ITERATIONS};
pub use random::random_bytes;
pub use symmetric::{decrypt, decrypt_binary, encrypt, Plaintext};

/// Size of a symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-CBC initialization vector
pub const IV_SIZE: usize = 16;

/// AES block size
pub const BLOCK_SIZE: usize = 16;

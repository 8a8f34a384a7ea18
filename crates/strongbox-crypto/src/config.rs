//! Codec configuration and the validated chunk size

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use crate::error::{CodecError, CodecResult};

/// Units fed to a cipher or hash per cooperative step when a call does not
/// choose its own.
pub const DEFAULT_CHUNK_SIZE: usize = 65536;

/// RSA modulus size used when a key pair is generated without an explicit size.
pub const DEFAULT_KEY_BITS: usize = 4096;

/// Number of input units (bytes or characters) fed to the underlying
/// primitive per step. Always at least 1.
///
/// Chunking never changes the cryptographic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSize(NonZeroUsize);

impl ChunkSize {
    pub fn new(units: usize) -> CodecResult<Self> {
        NonZeroUsize::new(units)
            .map(Self)
            .ok_or(CodecError::InvalidChunkSize(units))
    }

    /// Validate a caller-supplied chunk size, falling back to `default`.
    pub fn resolve(requested: Option<usize>, default: usize) -> CodecResult<Self> {
        Self::new(requested.unwrap_or(default))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

const DEFAULT_CHUNK: NonZeroUsize = match NonZeroUsize::new(DEFAULT_CHUNK_SIZE) {
    Some(units) => units,
    None => panic!("DEFAULT_CHUNK_SIZE must be non-zero"),
};

impl Default for ChunkSize {
    fn default() -> Self {
        Self(DEFAULT_CHUNK)
    }
}

/// Codec defaults, loadable from strongbox.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Chunk size used when an operation is called without one (default: 65536)
    pub chunk_size: usize,
    /// RSA modulus bit length for key-pair generation (default: 4096)
    pub key_bits: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            key_bits: DEFAULT_KEY_BITS,
        }
    }
}

impl CodecConfig {
    /// Parse a TOML document. Call [`CodecConfig::validate`] before use.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn validate(&self) -> CodecResult<()> {
        ChunkSize::new(self.chunk_size).map(|_| ())
    }
}

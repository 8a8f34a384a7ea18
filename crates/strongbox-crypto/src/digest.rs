//! Chunked SHA-256 digest of text

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::{ChunkSize, DEFAULT_CHUNK_SIZE};
use crate::error::CodecResult;
use crate::stream::{byte_slices, drive, Incremental};

struct HashStream(Sha256);

impl Incremental for HashStream {
    type Output = String;

    fn update(&mut self, slice: &[u8]) -> CodecResult<()> {
        self.0.update(slice);
        Ok(())
    }

    fn finalize(self) -> CodecResult<String> {
        Ok(hex::encode(self.0.finalize()))
    }
}

/// SHA-256 of the UTF-8 encoding of `input`, as 64 lowercase hex characters.
///
/// The result does not depend on `chunk_size`.
pub async fn digest(input: &str, chunk_size: Option<usize>) -> CodecResult<String> {
    let chunk = ChunkSize::resolve(chunk_size, DEFAULT_CHUNK_SIZE)?;
    debug!(input_len = input.len(), chunk = chunk.get(), "digesting");
    drive(HashStream(Sha256::new()), byte_slices(input.as_bytes(), chunk)).await
}

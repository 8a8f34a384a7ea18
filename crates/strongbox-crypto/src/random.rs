//! Cryptographically secure random bytes

use rand::RngCore;

use crate::error::{CodecError, CodecResult};

/// Fill `buf` from the thread-local CSPRNG (seeded from the OS).
pub(crate) fn fill_random(buf: &mut [u8]) -> CodecResult<()> {
    rand::thread_rng()
        .try_fill_bytes(buf)
        .map_err(|e| CodecError::RandomSourceExhausted(e.to_string()))
}

/// Generate `length` random bytes, hex-encoded (`2 * length` characters).
pub async fn random_bytes(length: usize) -> CodecResult<String> {
    let mut bytes = vec![0u8; length];
    fill_random(&mut bytes)?;
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hex_length_matches() {
        let hex = random_bytes(16).await.unwrap();
        assert_eq!(hex.len(), 32);
        assert_eq!(hex::decode(&hex).unwrap().len(), 16);
    }

    #[tokio::test]
    async fn zero_length() {
        assert_eq!(random_bytes(0).await.unwrap(), "");
    }

    #[tokio::test]
    async fn successive_calls_differ() {
        let a = random_bytes(32).await.unwrap();
        let b = random_bytes(32).await.unwrap();
        assert_ne!(a, b, "random output must not repeat");
    }
}

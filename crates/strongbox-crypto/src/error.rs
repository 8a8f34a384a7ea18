use thiserror::Error;

pub type CodecResult<T> = Result<T, CodecError>;

/// Every failure a codec operation can report.
///
/// Validation failures and primitive failures share this one type so each
/// operation has a single failure path.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("chunk size must be at least 1, got {0}")]
    InvalidChunkSize(usize),

    #[error("malformed encrypted input: expected <algorithm>:<iv>:<ciphertext>")]
    MalformedEnvelope,

    #[error("algorithm in input is not supported: {0}")]
    UnsupportedCipher(String),

    #[error("symmetric decryption failed: wrong key or corrupted data")]
    SymmetricDecryptionFailed,

    #[error("invalid symmetric key: {0}")]
    InvalidKey(String),

    #[error("key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("key pair not generated: {0}")]
    KeyPairGenerationFailed(String),

    #[error("random source failed: {0}")]
    RandomSourceExhausted(String),

    #[error("asymmetric operation failed: {0}")]
    AsymmetricOperationFailed(String),
}

/// Payload-free discriminant of [`CodecError`], for callers that branch on
/// the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidChunkSize,
    MalformedEnvelope,
    UnsupportedCipher,
    SymmetricDecryptionFailed,
    InvalidKey,
    KeyDerivationFailed,
    KeyPairGenerationFailed,
    RandomSourceExhausted,
    AsymmetricOperationFailed,
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidChunkSize(_) => ErrorKind::InvalidChunkSize,
            Self::MalformedEnvelope => ErrorKind::MalformedEnvelope,
            Self::UnsupportedCipher(_) => ErrorKind::UnsupportedCipher,
            Self::SymmetricDecryptionFailed => ErrorKind::SymmetricDecryptionFailed,
            Self::InvalidKey(_) => ErrorKind::InvalidKey,
            Self::KeyDerivationFailed(_) => ErrorKind::KeyDerivationFailed,
            Self::KeyPairGenerationFailed(_) => ErrorKind::KeyPairGenerationFailed,
            Self::RandomSourceExhausted(_) => ErrorKind::RandomSourceExhausted,
            Self::AsymmetricOperationFailed(_) => ErrorKind::AsymmetricOperationFailed,
        }
    }

    /// True when the underlying primitive could not produce output at all.
    /// These are unexpected conditions, not input validation failures.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::KeyDerivationFailed
                | ErrorKind::KeyPairGenerationFailed
                | ErrorKind::RandomSourceExhausted
        )
    }
}

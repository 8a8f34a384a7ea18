//! Symmetric envelope wire format
//!
//! ```text
//! <algorithm>:<iv-hex>:<ciphertext-hex>
//! ```
//!
//! The envelope carries no version field. A new format means a new
//! [`CipherAlgorithm`] variant with its own name, never a different shape.

use std::fmt;
use std::str::FromStr;

use crate::error::{CodecError, CodecResult};

const SEPARATOR: char = ':';

/// The closed set of symmetric algorithms an envelope may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherAlgorithm {
    /// AES-256 in CBC mode with PKCS#7 padding
    AesCbc,
}

impl CipherAlgorithm {
    pub const ALL: &'static [CipherAlgorithm] = &[CipherAlgorithm::AesCbc];

    /// Identifier written into the envelope.
    pub fn name(self) -> &'static str {
        match self {
            Self::AesCbc => "AES-CBC",
        }
    }

    /// IV length in bytes.
    pub fn iv_len(self) -> usize {
        match self {
            Self::AesCbc => 16,
        }
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CipherAlgorithm {
    type Err = CodecError;

    fn from_str(s: &str) -> CodecResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|alg| alg.name() == s)
            .ok_or_else(|| CodecError::UnsupportedCipher(s.to_string()))
    }
}

/// A parsed envelope. The ciphertext stays hex-encoded so it can be decoded
/// slice by slice while streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub algorithm: CipherAlgorithm,
    pub iv: Vec<u8>,
    pub ciphertext_hex: &'a str,
}

impl<'a> Envelope<'a> {
    /// Parse `<algorithm>:<iv-hex>:<ciphertext-hex>`.
    ///
    /// Anything other than exactly three non-empty fields is
    /// [`CodecError::MalformedEnvelope`], as is an IV that is not hex or has
    /// the wrong length for the algorithm. An unknown algorithm is
    /// [`CodecError::UnsupportedCipher`].
    pub fn parse(input: &'a str) -> CodecResult<Self> {
        let mut fields = input.split(SEPARATOR);
        let (Some(algorithm), Some(iv_hex), Some(ciphertext_hex), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(CodecError::MalformedEnvelope);
        };
        if algorithm.is_empty() || iv_hex.is_empty() || ciphertext_hex.is_empty() {
            return Err(CodecError::MalformedEnvelope);
        }

        let algorithm: CipherAlgorithm = algorithm.parse()?;

        let iv = hex::decode(iv_hex).map_err(|_| CodecError::MalformedEnvelope)?;
        if iv.len() != algorithm.iv_len() {
            return Err(CodecError::MalformedEnvelope);
        }

        Ok(Self {
            algorithm,
            iv,
            ciphertext_hex,
        })
    }

    /// Render an envelope from raw IV and ciphertext bytes (lowercase hex).
    pub fn format(algorithm: CipherAlgorithm, iv: &[u8], ciphertext: &[u8]) -> String {
        format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            algorithm.name(),
            hex::encode(iv),
            hex::encode(ciphertext)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IV_HEX: &str = "000102030405060708090a0b0c0d0e0f";

    fn assert_malformed(input: &str) {
        assert!(
            matches!(Envelope::parse(input), Err(CodecError::MalformedEnvelope)),
            "expected MalformedEnvelope for {input:?}"
        );
    }

    #[test]
    fn parse_valid() {
        let input = format!("AES-CBC:{IV_HEX}:deadbeef");
        let env = Envelope::parse(&input).unwrap();
        assert_eq!(env.algorithm, CipherAlgorithm::AesCbc);
        assert_eq!(env.iv, (0u8..16).collect::<Vec<_>>());
        assert_eq!(env.ciphertext_hex, "deadbeef");
    }

    #[test]
    fn missing_fields_are_malformed() {
        assert_malformed(":iv:ct");
        assert_malformed("ALG::ct");
        assert_malformed("ALG:iv:");
        assert_malformed("ALG:iv");
        assert_malformed("");
        assert_malformed("::");
    }

    #[test]
    fn extra_field_is_malformed() {
        assert_malformed(&format!("AES-CBC:{IV_HEX}:00:11"));
    }

    #[test]
    fn unknown_algorithm_is_named() {
        match Envelope::parse("FooBar:00ff:00ff") {
            Err(CodecError::UnsupportedCipher(name)) => assert_eq!(name, "FooBar"),
            other => panic!("expected UnsupportedCipher, got {other:?}"),
        }
    }

    #[test]
    fn algorithm_name_is_case_sensitive() {
        assert!(matches!(
            Envelope::parse(&format!("aes-cbc:{IV_HEX}:00")),
            Err(CodecError::UnsupportedCipher(_))
        ));
    }

    #[test]
    fn bad_iv_is_malformed() {
        assert_malformed("AES-CBC:zz:00");
        assert_malformed("AES-CBC:0001:00");
    }

    #[test]
    fn format_is_lowercase_hex() {
        let s = Envelope::format(CipherAlgorithm::AesCbc, &[0xAB; 16], &[0xCD, 0xEF]);
        assert_eq!(s, "AES-CBC:abababababababababababababababab:cdef");
    }
}

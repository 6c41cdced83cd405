//! Delete tokens: proof that the caller created a note.
//!
//! The client generates 32 random bytes (sent as standard base64 text) when a
//! note is first saved and keeps the token locally. The server only ever
//! stores `hex(SHA-256(token_text))` and checks a presented token against it
//! in constant time.

use std::fmt;
use std::str::FromStr;

use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroizing;

use crate::random::{random_array, RandomError};
use crate::{decode_base64, encode_base64, Digest, Sha256};

/// Raw token length in bytes.
pub const TOKEN_BYTES: usize = 32;
/// Length of a token hash in hex characters.
pub const HASH_HEX_LEN: usize = 64;

/// A client-held delete token. Never persisted server-side.
#[derive(Clone, PartialEq, Eq)]
pub struct DeleteToken(Zeroizing<String>);

impl DeleteToken {
    /// Generate a fresh token.
    ///
    /// # Errors
    ///
    /// Returns [`RandomError`] if the platform generator fails.
    pub fn generate() -> Result<Self, RandomError> {
        let bytes = Zeroizing::new(random_array::<TOKEN_BYTES>()?);
        Ok(Self(Zeroizing::new(encode_base64(&bytes[..]))))
    }

    /// Wrap token text read back from client storage or a request.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(Zeroizing::new(text.into()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn hash(&self) -> DeleteTokenHash {
        hash_token(self.as_str())
    }
}

impl fmt::Debug for DeleteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeleteToken(..)")
    }
}

/// Lowercase hex SHA-256 of a token's text. Guaranteed 64 hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeleteTokenHash(String);

/// Error returned when a string is not a valid token hash.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid delete token hash: {reason}")]
pub struct TokenHashError {
    reason: &'static str,
}

impl DeleteTokenHash {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DeleteTokenHash {
    type Err = TokenHashError;

    /// Accepts upper- or lowercase hex and normalizes to lowercase.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != HASH_HEX_LEN {
            return Err(TokenHashError {
                reason: "must be exactly 64 characters",
            });
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TokenHashError {
                reason: "contains non-hex characters",
            });
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl fmt::Display for DeleteTokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for DeleteTokenHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for DeleteTokenHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// `hex(SHA-256(token))` over the token's UTF-8 text.
#[must_use]
pub fn hash_token(token: &str) -> DeleteTokenHash {
    DeleteTokenHash(format!("{:x}", Sha256::digest(token.as_bytes())))
}

fn is_well_formed(token: &str) -> bool {
    decode_base64(token).is_ok_and(|bytes| bytes.len() == TOKEN_BYTES)
}

/// Constant-time equality of two hashes. Both are always 64 hex bytes, so
/// the comparison touches every byte whatever the first mismatch is.
fn hashes_equal(computed: &DeleteTokenHash, stored: &DeleteTokenHash) -> Choice {
    computed.0.as_bytes().ct_eq(stored.0.as_bytes())
}

/// Check a presented token against the stored hash.
///
/// Missing, malformed and mismatched tokens all return `false`. The hash
/// comparison is constant-time and runs regardless of well-formedness.
#[must_use]
pub fn verify(candidate: Option<&str>, stored: &DeleteTokenHash) -> bool {
    let candidate = candidate.unwrap_or_default();
    let computed = hash_token(candidate);
    let well_formed = Choice::from(u8::from(is_well_formed(candidate)));
    (hashes_equal(&computed, stored) & well_formed).into()
}

//! Note envelope: the versioned, transport-safe record holding one sealed note.
//!
//! Wire form (JSON, standard base64 with padding):
//!
//! ```json
//! { "version": 1, "salt": "<16 bytes>", "iv": "<12 bytes>", "ciphertext": "<...>" }
//! ```
//!
//! Deserialization goes through [`WireEnvelope`] and is validated before an
//! [`Envelope`] exists, so malformed input never reaches the cipher.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cipher::{IV_LEN, TAG_LEN};
use crate::kdf::SALT_LEN;
use crate::{decode_base64, encode_base64};

/// Envelope version written by this build.
pub const ENVELOPE_VERSION: u32 = 1;
/// Versions this build can open.
pub const SUPPORTED_VERSIONS: &[u32] = &[ENVELOPE_VERSION];
/// Maximum length, in bytes, of the base64 `ciphertext` field (5 MiB).
///
/// Only the ciphertext text is bounded. The serialized envelope adds a fixed
/// overhead on top (version, 24-character salt, 16-character iv, JSON
/// punctuation) of well under 100 bytes, see [`ENVELOPE_JSON_OVERHEAD`].
pub const MAX_ENCODED_CIPHERTEXT: usize = 5 * 1024 * 1024;

/// Upper bound on the serialized envelope size beyond its ciphertext text.
pub const ENVELOPE_JSON_OVERHEAD: usize = 96;

/// Errors from envelope parsing or construction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid base64 in envelope field `{0}`")]
    InvalidEncoding(&'static str),
    #[error("envelope field `{field}` must decode to {expected} bytes")]
    InvalidLength {
        field: &'static str,
        expected: usize,
    },
    #[error("ciphertext too small (minimum {TAG_LEN} bytes)")]
    CiphertextTooSmall,
    #[error("envelope too large ({size} > {max} encoded bytes)")]
    TooLarge { size: usize, max: usize },
    #[error("malformed envelope: {0}")]
    Malformed(String),
}

/// Unvalidated envelope exactly as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEnvelope {
    pub version: u32,
    pub salt: String,
    pub iv: String,
    pub ciphertext: String,
}

/// A parsed and validated note envelope.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireEnvelope", into = "WireEnvelope")]
pub struct Envelope {
    version: u32,
    salt: [u8; SALT_LEN],
    iv: [u8; IV_LEN],
    ciphertext: Vec<u8>,
}

/// Length of the padded base64 encoding of `n` bytes.
#[must_use]
pub const fn encoded_len(n: usize) -> usize {
    n.div_ceil(3) * 4
}

fn decode_fixed<const N: usize>(field: &'static str, text: &str) -> Result<[u8; N], EnvelopeError> {
    let bytes = decode_base64(text).map_err(|_| EnvelopeError::InvalidEncoding(field))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| EnvelopeError::InvalidLength { field, expected: N })
}

impl Envelope {
    /// Build a current-version envelope from raw parts.
    ///
    /// # Errors
    ///
    /// Returns `CiphertextTooSmall` if the ciphertext cannot even hold a GCM
    /// tag, or `TooLarge` if its encoding would exceed
    /// [`MAX_ENCODED_CIPHERTEXT`].
    pub fn build(
        salt: [u8; SALT_LEN],
        iv: [u8; IV_LEN],
        ciphertext: Vec<u8>,
    ) -> Result<Self, EnvelopeError> {
        if ciphertext.len() < TAG_LEN {
            return Err(EnvelopeError::CiphertextTooSmall);
        }
        let size = encoded_len(ciphertext.len());
        if size > MAX_ENCODED_CIPHERTEXT {
            return Err(EnvelopeError::TooLarge {
                size,
                max: MAX_ENCODED_CIPHERTEXT,
            });
        }
        Ok(Self {
            version: ENVELOPE_VERSION,
            salt,
            iv,
            ciphertext,
        })
    }

    /// Parse and validate an envelope from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or any field is invalid.
    /// An unknown version is reported as `UnsupportedVersion` before any
    /// other field is inspected.
    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        let wire: WireEnvelope =
            serde_json::from_str(json).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
        Self::try_from(wire)
    }

    /// Serialize to the JSON wire form.
    #[must_use]
    pub fn to_json(&self) -> String {
        let wire = WireEnvelope::from(self.clone());
        // Plain strings and an integer: serialization cannot fail.
        serde_json::to_string(&wire).unwrap_or_default()
    }

    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    #[must_use]
    pub const fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    #[must_use]
    pub const fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Length of the base64 ciphertext text, the quantity the size cap bounds.
    #[must_use]
    pub fn encoded_ciphertext_len(&self) -> usize {
        encoded_len(self.ciphertext.len())
    }
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = EnvelopeError;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        if !SUPPORTED_VERSIONS.contains(&wire.version) {
            return Err(EnvelopeError::UnsupportedVersion(wire.version));
        }
        if wire.ciphertext.len() > MAX_ENCODED_CIPHERTEXT {
            return Err(EnvelopeError::TooLarge {
                size: wire.ciphertext.len(),
                max: MAX_ENCODED_CIPHERTEXT,
            });
        }
        let salt = decode_fixed::<SALT_LEN>("salt", &wire.salt)?;
        let iv = decode_fixed::<IV_LEN>("iv", &wire.iv)?;
        let ciphertext = decode_base64(&wire.ciphertext)
            .map_err(|_| EnvelopeError::InvalidEncoding("ciphertext"))?;
        if ciphertext.len() < TAG_LEN {
            return Err(EnvelopeError::CiphertextTooSmall);
        }
        Ok(Self {
            version: wire.version,
            salt,
            iv,
            ciphertext,
        })
    }
}

impl From<Envelope> for WireEnvelope {
    fn from(envelope: Envelope) -> Self {
        Self {
            version: envelope.version,
            salt: encode_base64(&envelope.salt),
            iv: encode_base64(&envelope.iv),
            ciphertext: encode_base64(&envelope.ciphertext),
        }
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("version", &self.version)
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

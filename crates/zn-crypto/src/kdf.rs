//! Password-based key derivation (PBKDF2-HMAC-SHA256).
//!
//! Parameters are tied to the envelope version so that a future version can
//! raise the iteration count without breaking notes sealed under version 1.
//! The iteration count is a deliberate brute-force throttle; do not lower it.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;
/// Derived key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// KDF parameters for a given envelope version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub iterations: u32,
}

impl KdfParams {
    /// Version 1: 100,000 iterations of HMAC-SHA256.
    pub const V1: Self = Self {
        iterations: 100_000,
    };

    /// Look up the parameters for an envelope version.
    ///
    /// Returns `None` for versions this build does not know how to open.
    #[must_use]
    pub const fn for_version(version: u32) -> Option<Self> {
        match version {
            1 => Some(Self::V1),
            _ => None,
        }
    }
}

/// A 256-bit symmetric key derived from a password. Wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct NoteKey([u8; KEY_LEN]);

impl NoteKey {
    /// Wrap raw key bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for NoteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NoteKey(..)")
    }
}

/// Derive a note key from `password` and `salt`.
///
/// Deterministic for identical inputs. Any string is accepted, including the
/// empty string; password policy belongs to the UI.
#[must_use]
pub fn derive_key(password: &str, salt: &[u8; SALT_LEN], params: KdfParams) -> NoteKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, params.iterations, &mut key);
    let derived = NoteKey(key);
    key.zeroize();
    derived
}

//! Encryption/decryption facade used by the editor.
//!
//! [`seal_note`] and [`open_note`] compose the KDF, the cipher and the
//! envelope codec. Every failure is folded into [`VaultError`], which maps
//! onto the small set of [`UserOutcome`]s the UI is allowed to show.

use zeroize::Zeroizing;

use crate::cipher::{self, CipherError, IV_LEN};
use crate::envelope::{Envelope, EnvelopeError};
use crate::kdf::{derive_key, KdfParams, SALT_LEN};
use crate::note::{NoteContent, NoteContentError};
use crate::random::{random_array, RandomError};

/// Fixed password used for notes the owner chose not to protect.
///
/// Unprotected notes still get a real envelope, so stored notes all look
/// alike. Opening a note tries this value first.
pub const NO_PASSWORD_SENTINEL: &str = "zeronote/unprotected/v1/9c4e1f7a2b6d";

/// A password held only for the duration of a seal/open call. Wiped on drop.
#[derive(Clone)]
pub struct Passphrase {
    secret: Zeroizing<String>,
    user_supplied: bool,
}

impl Passphrase {
    /// The no-password sentinel.
    #[must_use]
    pub fn unprotected() -> Self {
        Self {
            secret: Zeroizing::new(NO_PASSWORD_SENTINEL.to_string()),
            user_supplied: false,
        }
    }

    /// A password typed by the user. No strength policy is applied here.
    #[must_use]
    pub fn user(password: impl Into<String>) -> Self {
        Self {
            secret: Zeroizing::new(password.into()),
            user_supplied: true,
        }
    }

    /// UI hint only; not a security boundary.
    #[must_use]
    pub const fn is_user_supplied(&self) -> bool {
        self.user_supplied
    }

    fn expose(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Passphrase")
            .field("user_supplied", &self.user_supplied)
            .finish_non_exhaustive()
    }
}

/// What the user is told when a vault operation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOutcome {
    /// Wrong password, or the data was altered. Ask again.
    RetryPassword,
    /// The stored note cannot be read.
    Unreadable,
    /// The note was written by a newer format version.
    Unsupported,
    /// Security operations cannot run in this environment.
    Unavailable,
    /// The note is too large to save.
    TooLarge,
}

/// Facade failures.
///
/// `Decryption` deliberately covers wrong password, tampering and a
/// mismatched salt/iv alike.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VaultError {
    #[error("secure random source unavailable")]
    Unavailable,
    #[error("unable to decrypt note")]
    Decryption,
    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid envelope: {0}")]
    Envelope(EnvelopeError),
    #[error("note too large ({size} > {max} encoded bytes)")]
    TooLarge { size: usize, max: usize },
    #[error("decrypted note content is corrupted")]
    Corrupted,
    #[error("note content is invalid: {0}")]
    InvalidContent(#[from] NoteContentError),
    #[error("encryption failed")]
    Encryption,
}

impl VaultError {
    /// Collapse to the outcome shown to the user.
    #[must_use]
    pub const fn user_outcome(&self) -> UserOutcome {
        match self {
            Self::Decryption => UserOutcome::RetryPassword,
            Self::UnsupportedVersion(_) => UserOutcome::Unsupported,
            Self::TooLarge { .. } => UserOutcome::TooLarge,
            Self::Unavailable | Self::Encryption => UserOutcome::Unavailable,
            Self::Envelope(_) | Self::Corrupted | Self::InvalidContent(_) => {
                UserOutcome::Unreadable
            }
        }
    }
}

impl From<EnvelopeError> for VaultError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::UnsupportedVersion(v) => Self::UnsupportedVersion(v),
            EnvelopeError::TooLarge { size, max } => Self::TooLarge { size, max },
            other => Self::Envelope(other),
        }
    }
}

impl From<RandomError> for VaultError {
    fn from(_: RandomError) -> Self {
        Self::Unavailable
    }
}

/// Fresh salt and IV for one seal operation. Never reuse them.
pub(crate) fn fresh_nonce_material() -> Result<([u8; SALT_LEN], [u8; IV_LEN]), RandomError> {
    Ok((random_array()?, random_array()?))
}

/// Encrypt `note` under `passphrase` into a new envelope.
///
/// A new salt and IV are drawn on every call, including retries.
///
/// # Errors
///
/// Returns `InvalidContent` if the note breaks its invariants, `TooLarge`
/// if the sealed note would exceed the envelope size cap, and `Unavailable`
/// if no secure randomness is available.
pub fn seal_note(note: &NoteContent, passphrase: &Passphrase) -> Result<Envelope, VaultError> {
    note.validate()?;
    let (salt, iv) = fresh_nonce_material()?;
    let key = derive_key(passphrase.expose(), &salt, KdfParams::V1);
    let plaintext = Zeroizing::new(serde_json::to_vec(note).map_err(|_| VaultError::Encryption)?);
    let ciphertext = cipher::encrypt(&key, &iv, &plaintext).map_err(|_| VaultError::Encryption)?;
    Ok(Envelope::build(salt, iv, ciphertext)?)
}

/// Decrypt `envelope` with `passphrase`.
///
/// # Errors
///
/// Returns `Decryption` if authentication fails (wrong password or altered
/// data), `UnsupportedVersion` for unknown versions, and `Corrupted` if the
/// plaintext is not a valid note.
pub fn open_note(envelope: &Envelope, passphrase: &Passphrase) -> Result<NoteContent, VaultError> {
    let params = KdfParams::for_version(envelope.version())
        .ok_or(VaultError::UnsupportedVersion(envelope.version()))?;
    let key = derive_key(passphrase.expose(), envelope.salt(), params);
    let plaintext = Zeroizing::new(
        cipher::decrypt(&key, envelope.iv(), envelope.ciphertext())
            .map_err(|_: CipherError| VaultError::Decryption)?,
    );
    let note: NoteContent =
        serde_json::from_slice(&plaintext).map_err(|_| VaultError::Corrupted)?;
    note.validate().map_err(|_| VaultError::Corrupted)?;
    Ok(note)
}

/// Parse envelope JSON and decrypt it.
///
/// # Errors
///
/// As [`Envelope::from_json`] and [`open_note`].
pub fn open_note_json(json: &str, passphrase: &Passphrase) -> Result<NoteContent, VaultError> {
    let envelope = Envelope::from_json(json)?;
    open_note(&envelope, passphrase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::WireEnvelope;
    use crate::note::Tab;
    use crate::{decode_base64, encode_base64};
    use std::collections::HashSet;

    fn hello_note() -> NoteContent {
        NoteContent {
            tabs: vec![Tab {
                id: "t1".to_string(),
                name: "Tab 1".to_string(),
                title: String::new(),
                content: "hello world".to_string(),
                created_at: 0,
                updated_at: 0,
            }],
            active_tab: 0,
            last_saved: 0,
        }
    }

    fn flip_field(envelope: &Envelope, field: &str, index: usize) -> Envelope {
        let mut wire = WireEnvelope::from(envelope.clone());
        let target = match field {
            "iv" => &mut wire.iv,
            "salt" => &mut wire.salt,
            _ => &mut wire.ciphertext,
        };
        let mut bytes = decode_base64(target).expect("valid base64");
        bytes[index] ^= 0x80;
        *target = encode_base64(&bytes);
        Envelope::try_from(wire).expect("still well-formed")
    }

    #[test]
    fn correct_password_roundtrips_hello_note() {
        let note = hello_note();
        let envelope = seal_note(&note, &Passphrase::user("correct-horse")).expect("seal");
        let opened = open_note(&envelope, &Passphrase::user("correct-horse")).expect("open");
        assert_eq!(opened, note);
    }

    #[test]
    fn wrong_password_fails_closed() {
        let envelope = seal_note(&hello_note(), &Passphrase::user("correct-horse")).expect("seal");
        let err = open_note(&envelope, &Passphrase::user("wrong-password")).unwrap_err();
        assert_eq!(err, VaultError::Decryption);
        assert_eq!(err.user_outcome(), UserOutcome::RetryPassword);
    }

    #[test]
    fn unprotected_note_opens_with_sentinel_only() {
        let envelope = seal_note(&hello_note(), &Passphrase::unprotected()).expect("seal");
        assert!(open_note(&envelope, &Passphrase::unprotected()).is_ok());
        assert_eq!(
            open_note(&envelope, &Passphrase::user("")),
            Err(VaultError::Decryption)
        );
    }

    #[test]
    fn flipped_ciphertext_byte_is_rejected() {
        let envelope = seal_note(&hello_note(), &Passphrase::user("pw")).expect("seal");
        let last = envelope.ciphertext().len() - 1;
        for index in [0, last / 2, last] {
            let tampered = flip_field(&envelope, "ciphertext", index);
            assert_eq!(
                open_note(&tampered, &Passphrase::user("pw")),
                Err(VaultError::Decryption)
            );
        }
    }

    #[test]
    fn flipped_iv_byte_is_rejected() {
        let envelope = seal_note(&hello_note(), &Passphrase::user("pw")).expect("seal");
        let tampered = flip_field(&envelope, "iv", 5);
        assert_eq!(
            open_note(&tampered, &Passphrase::user("pw")),
            Err(VaultError::Decryption)
        );
    }

    #[test]
    fn flipped_salt_byte_is_rejected() {
        let envelope = seal_note(&hello_note(), &Passphrase::user("pw")).expect("seal");
        let tampered = flip_field(&envelope, "salt", 0);
        assert_eq!(
            open_note(&tampered, &Passphrase::user("pw")),
            Err(VaultError::Decryption)
        );
    }

    #[test]
    fn resealing_draws_new_salt_and_iv() {
        let note = hello_note();
        let pw = Passphrase::user("same");
        let a = seal_note(&note, &pw).expect("seal");
        let b = seal_note(&note, &pw).expect("seal");
        assert_ne!(a.salt(), b.salt());
        assert_ne!(a.iv(), b.iv());
        assert_ne!(a.ciphertext(), b.ciphertext());
    }

    #[test]
    fn nonce_material_never_collides() {
        let mut salts = HashSet::new();
        let mut ivs = HashSet::new();
        for _ in 0..10_000 {
            let (salt, iv) = fresh_nonce_material().expect("rng");
            assert!(salts.insert(salt), "salt collision");
            assert!(ivs.insert(iv), "iv collision");
        }
    }

    #[test]
    fn oversized_note_is_rejected_before_transmission() {
        let mut note = hello_note();
        note.tabs[0].content = "x".repeat(crate::envelope::MAX_ENCODED_CIPHERTEXT);
        let err = seal_note(&note, &Passphrase::user("pw")).unwrap_err();
        assert!(matches!(err, VaultError::TooLarge { .. }));
        assert_eq!(err.user_outcome(), UserOutcome::TooLarge);
    }

    #[test]
    fn invalid_content_is_not_sealed() {
        let mut note = hello_note();
        note.active_tab = 1;
        let err = seal_note(&note, &Passphrase::user("pw")).unwrap_err();
        assert!(matches!(err, VaultError::InvalidContent(_)));
    }

    #[test]
    fn non_note_plaintext_is_reported_as_corrupted() {
        let salt = [1u8; SALT_LEN];
        let iv = [2u8; IV_LEN];
        let key = derive_key("pw", &salt, KdfParams::V1);
        let ct = cipher::encrypt(&key, &iv, b"{\"not\":\"a note\"}").expect("encrypt");
        let envelope = Envelope::build(salt, iv, ct).expect("build");
        let err = open_note(&envelope, &Passphrase::user("pw")).unwrap_err();
        assert_eq!(err, VaultError::Corrupted);
        assert_eq!(err.user_outcome(), UserOutcome::Unreadable);
    }

    #[test]
    fn unsupported_version_is_distinct_from_wrong_password() {
        let envelope = seal_note(&hello_note(), &Passphrase::user("pw")).expect("seal");
        let mut wire = WireEnvelope::from(envelope);
        wire.version = 2;
        let json = serde_json::to_string(&wire).expect("json");
        let err = open_note_json(&json, &Passphrase::user("pw")).unwrap_err();
        assert_eq!(err, VaultError::UnsupportedVersion(2));
        assert_eq!(err.user_outcome(), UserOutcome::Unsupported);
    }

    #[test]
    fn errors_do_not_leak_secrets() {
        let envelope = seal_note(&hello_note(), &Passphrase::user("hunter2")).expect("seal");
        let err = open_note(&envelope, &Passphrase::user("hunter3")).unwrap_err();
        let text = err.to_string();
        assert!(!text.contains("hunter"));
        assert!(!text.contains("hello"));
        assert!(!format!("{:?}", Passphrase::user("hunter2")).contains("hunter2"));
    }
}

//! Opening a stored note by trial decryption.
//!
//! ```text
//! Locked --attempt_sentinel--> Unlocked
//!                          \-> PasswordRequired --attempt_password--> Unlocked
//!                          \-> Rejected (unreadable/unsupported)  \-> Rejected (retry)
//! ```
//!
//! There is no flag saying whether a note is password protected: success
//! with the sentinel is the only signal. A rejection with
//! [`UserOutcome::RetryPassword`] accepts further password attempts; other
//! rejections are final.

use crate::envelope::Envelope;
use crate::note::NoteContent;
use crate::vault::{open_note, Passphrase, UserOutcome, VaultError};

/// A successfully opened note together with the passphrase that opened it,
/// which is needed to re-seal edits.
#[derive(Debug, Clone)]
pub struct UnlockedNote {
    pub content: NoteContent,
    pub passphrase: Passphrase,
}

#[derive(Debug, Clone)]
pub enum UnlockState {
    Locked(Envelope),
    PasswordRequired(Envelope),
    Unlocked(UnlockedNote),
    Rejected {
        envelope: Envelope,
        outcome: UserOutcome,
    },
}

impl UnlockState {
    #[must_use]
    pub const fn new(envelope: Envelope) -> Self {
        Self::Locked(envelope)
    }

    /// Try the no-password sentinel. Only meaningful from `Locked`; any other
    /// state is returned unchanged.
    #[must_use]
    pub fn attempt_sentinel(self) -> Self {
        match self {
            Self::Locked(envelope) => match try_open(&envelope, Passphrase::unprotected()) {
                Ok(unlocked) => Self::Unlocked(unlocked),
                Err(VaultError::Decryption) => Self::PasswordRequired(envelope),
                Err(err) => Self::Rejected {
                    envelope,
                    outcome: err.user_outcome(),
                },
            },
            other => other,
        }
    }

    /// Try a user password. Allowed from `PasswordRequired` and from a
    /// retryable `Rejected`; any other state is returned unchanged.
    #[must_use]
    pub fn attempt_password(self, password: Passphrase) -> Self {
        match self {
            Self::PasswordRequired(envelope)
            | Self::Rejected {
                envelope,
                outcome: UserOutcome::RetryPassword,
            } => match try_open(&envelope, password) {
                Ok(unlocked) => Self::Unlocked(unlocked),
                Err(err) => Self::Rejected {
                    envelope,
                    outcome: err.user_outcome(),
                },
            },
            other => other,
        }
    }

    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        matches!(self, Self::Unlocked(_))
    }

    #[must_use]
    pub const fn needs_password(&self) -> bool {
        matches!(
            self,
            Self::PasswordRequired(_)
                | Self::Rejected {
                    outcome: UserOutcome::RetryPassword,
                    ..
                }
        )
    }

    /// Consume the state, yielding the opened note if unlocked.
    #[must_use]
    pub fn into_unlocked(self) -> Option<UnlockedNote> {
        match self {
            Self::Unlocked(note) => Some(note),
            _ => None,
        }
    }
}

fn try_open(envelope: &Envelope, passphrase: Passphrase) -> Result<UnlockedNote, VaultError> {
    let content = open_note(envelope, &passphrase)?;
    Ok(UnlockedNote {
        content,
        passphrase,
    })
}

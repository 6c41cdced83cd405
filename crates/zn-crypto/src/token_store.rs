//! Client side of the delete-token lifecycle.
//!
//! Tokens live in a [`TokenStore`] keyed by note name (browser local storage
//! in the editor, a map in tests). [`DeleteAuthority`] issues at most one
//! token per note and hands it back when the owner asks to delete.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::delete_token::{DeleteToken, DeleteTokenHash};
use crate::name::NoteName;

/// Key-value storage for delete tokens.
pub trait TokenStore {
    fn get(&self, note: &NoteName) -> Option<DeleteToken>;

    /// Persist a token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Unavailable` if the token could not be stored.
    fn set(&self, note: &NoteName, token: DeleteToken) -> Result<(), TokenError>;

    fn remove(&self, note: &NoteName);
}

/// In-memory [`TokenStore`].
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<HashMap<NoteName, DeleteToken>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, note: &NoteName) -> Option<DeleteToken> {
        self.tokens
            .lock()
            .ok()
            .and_then(|tokens| tokens.get(note).cloned())
    }

    fn set(&self, note: &NoteName, token: DeleteToken) -> Result<(), TokenError> {
        let mut tokens = self.tokens.lock().map_err(|_| TokenError::Unavailable)?;
        tokens.insert(note.clone(), token);
        Ok(())
    }

    fn remove(&self, note: &NoteName) {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.remove(note);
        }
    }
}

/// Delete-token errors. Anything that prevents a delete is `Unauthorized`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("cannot delete note")]
    Unauthorized,
    #[error("a delete token was already issued for this note")]
    AlreadyIssued,
    #[error("delete token could not be issued")]
    Unavailable,
}

/// Issues and presents delete tokens through an injected store.
pub struct DeleteAuthority<S> {
    store: S,
}

impl<S: TokenStore> DeleteAuthority<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Issue the token for a newly created note and return the hash to send
    /// with the first save.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyIssued` if this store already holds a token for the
    /// note; tokens are never rotated. Returns `Unavailable` if no token can
    /// be generated or the store refuses it, so a hash is only handed out for
    /// a token the client can later present.
    pub fn issue(&self, note: &NoteName) -> Result<DeleteTokenHash, TokenError> {
        if self.store.get(note).is_some() {
            return Err(TokenError::AlreadyIssued);
        }
        let token = DeleteToken::generate().map_err(|_| TokenError::Unavailable)?;
        let hash = token.hash();
        self.store.set(note, token)?;
        Ok(hash)
    }

    /// The token to present with a delete request.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if no token is held for the note.
    pub fn authorization(&self, note: &NoteName) -> Result<DeleteToken, TokenError> {
        self.store.get(note).ok_or(TokenError::Unauthorized)
    }

    /// Drop the token once the server confirmed the delete.
    pub fn forget(&self, note: &NoteName) {
        self.store.remove(note);
    }
}

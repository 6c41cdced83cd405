//! Note repository: opaque envelopes keyed by note name.
//!
//! The store never sees plaintext or passwords. It keeps the envelope, the
//! owner's delete-token hash (write-once) and timestamps.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use zn_crypto::{verify, DeleteTokenHash, Envelope, NoteName};

/// Stored note.
#[derive(Debug, Clone)]
pub struct NoteRecord {
    pub name: NoteName,
    pub envelope: Envelope,
    pub delete_token_hash: DeleteTokenHash,
    pub has_user_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`NoteRepo::save`].
#[derive(Debug, Clone)]
pub struct SaveNote {
    pub name: NoteName,
    pub envelope: Envelope,
    pub has_user_password: bool,
    /// Required when the note does not exist yet; ignored otherwise.
    pub delete_token_hash: Option<DeleteTokenHash>,
}

/// What a save did.
#[derive(Debug, Clone)]
pub enum SaveOutcome {
    Created(NoteRecord),
    Updated(NoteRecord),
}

impl SaveOutcome {
    #[must_use]
    pub const fn record(&self) -> &NoteRecord {
        match self {
            Self::Created(record) | Self::Updated(record) => record,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NoteRepoError {
    #[error("note not found")]
    NotFound,
    #[error("cannot delete note")]
    Unauthorized,
    #[error("a delete token hash is required to create a note")]
    MissingDeleteTokenHash,
    #[error("storage error: {0}")]
    Storage(String),
}

/// Repository trait for note persistence.
#[async_trait]
pub trait NoteRepo: Send + Sync {
    /// Fetch a note by name.
    async fn get(&self, name: &NoteName) -> Result<NoteRecord, NoteRepoError>;

    /// Create the note, or replace its envelope if it exists (last write wins).
    /// The delete-token hash of an existing note is never changed.
    async fn save(&self, note: SaveNote) -> Result<SaveOutcome, NoteRepoError>;

    /// Remove a note if `token` verifies against the hash stored on that
    /// same record. Check and removal are one step, so a token can never
    /// delete a note re-created under the same name by someone else.
    ///
    /// Missing, malformed and wrong tokens all yield `Unauthorized`.
    async fn delete(&self, name: &NoteName, token: Option<&str>) -> Result<(), NoteRepoError>;
}

/// Process-local [`NoteRepo`].
#[derive(Debug, Default)]
pub struct InMemoryNoteRepo {
    notes: RwLock<HashMap<NoteName, NoteRecord>>,
}

impl InMemoryNoteRepo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> NoteRepoError {
    NoteRepoError::Storage("note store lock poisoned".to_string())
}

#[async_trait]
impl NoteRepo for InMemoryNoteRepo {
    async fn get(&self, name: &NoteName) -> Result<NoteRecord, NoteRepoError> {
        let notes = self.notes.read().map_err(poisoned)?;
        notes.get(name).cloned().ok_or(NoteRepoError::NotFound)
    }

    async fn save(&self, note: SaveNote) -> Result<SaveOutcome, NoteRepoError> {
        let mut notes = self.notes.write().map_err(poisoned)?;
        let now = Utc::now();

        if let Some(existing) = notes.get_mut(&note.name) {
            existing.envelope = note.envelope;
            existing.has_user_password = note.has_user_password;
            existing.updated_at = now;
            return Ok(SaveOutcome::Updated(existing.clone()));
        }

        let delete_token_hash = note
            .delete_token_hash
            .ok_or(NoteRepoError::MissingDeleteTokenHash)?;
        let record = NoteRecord {
            name: note.name.clone(),
            envelope: note.envelope,
            delete_token_hash,
            has_user_password: note.has_user_password,
            created_at: now,
            updated_at: now,
        };
        notes.insert(note.name, record.clone());
        Ok(SaveOutcome::Created(record))
    }

    async fn delete(&self, name: &NoteName, token: Option<&str>) -> Result<(), NoteRepoError> {
        let mut notes = self.notes.write().map_err(poisoned)?;
        let record = notes.get(name).ok_or(NoteRepoError::NotFound)?;
        if !verify(token, &record.delete_token_hash) {
            return Err(NoteRepoError::Unauthorized);
        }
        notes.remove(name);
        Ok(())
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock implementation for testing

    use super::{async_trait, NoteName, NoteRecord, NoteRepoError, SaveNote, SaveOutcome, Utc};
    use std::sync::Mutex;

    pub struct MockNoteRepo {
        pub get_result: Mutex<Option<Result<NoteRecord, NoteRepoError>>>,
        pub save_result: Mutex<Option<Result<SaveOutcome, NoteRepoError>>>,
        pub delete_result: Mutex<Option<Result<(), NoteRepoError>>>,
    }

    impl MockNoteRepo {
        #[must_use]
        pub const fn new() -> Self {
            Self {
                get_result: Mutex::new(None),
                save_result: Mutex::new(None),
                delete_result: Mutex::new(None),
            }
        }

        /// Set the result that `get()` will return.
        ///
        /// # Panics
        ///
        /// Panics if the internal mutex is poisoned.
        pub fn set_get_result(&self, result: Result<NoteRecord, NoteRepoError>) {
            *self.get_result.lock().expect("lock poisoned") = Some(result);
        }

        /// Set the result that `save()` will return.
        ///
        /// # Panics
        ///
        /// Panics if the internal mutex is poisoned.
        pub fn set_save_result(&self, result: Result<SaveOutcome, NoteRepoError>) {
            *self.save_result.lock().expect("lock poisoned") = Some(result);
        }

        /// Set the result that `delete()` will return.
        ///
        /// # Panics
        ///
        /// Panics if the internal mutex is poisoned.
        pub fn set_delete_result(&self, result: Result<(), NoteRepoError>) {
            *self.delete_result.lock().expect("lock poisoned") = Some(result);
        }
    }

    impl Default for MockNoteRepo {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl super::NoteRepo for MockNoteRepo {
        async fn get(&self, _name: &NoteName) -> Result<NoteRecord, NoteRepoError> {
            self.get_result
                .lock()
                .expect("lock poisoned")
                .take()
                .unwrap_or(Err(NoteRepoError::NotFound))
        }

        async fn save(&self, note: SaveNote) -> Result<SaveOutcome, NoteRepoError> {
            if let Some(result) = self.save_result.lock().expect("lock poisoned").take() {
                return result;
            }
            let delete_token_hash = note
                .delete_token_hash
                .ok_or(NoteRepoError::MissingDeleteTokenHash)?;
            let now = Utc::now();
            Ok(SaveOutcome::Created(NoteRecord {
                name: note.name,
                envelope: note.envelope,
                delete_token_hash,
                has_user_password: note.has_user_password,
                created_at: now,
                updated_at: now,
            }))
        }

        async fn delete(
            &self,
            _name: &NoteName,
            _token: Option<&str>,
        ) -> Result<(), NoteRepoError> {
            self.delete_result
                .lock()
                .expect("lock poisoned")
                .take()
                .unwrap_or(Ok(()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zn_crypto::{seal_note, DeleteToken, NoteContent, Passphrase};

    fn envelope() -> Envelope {
        let note = NoteContent::new(1_700_000_000_000).expect("rng");
        seal_note(&note, &Passphrase::unprotected()).expect("seal")
    }

    fn save(name: &str, hash: Option<DeleteTokenHash>) -> SaveNote {
        SaveNote {
            name: NoteName::parse(name).expect("valid name"),
            envelope: envelope(),
            has_user_password: false,
            delete_token_hash: hash,
        }
    }

    #[tokio::test]
    async fn create_requires_delete_token_hash() {
        let repo = InMemoryNoteRepo::new();
        let result = repo.save(save("fresh", None)).await;
        assert!(matches!(result, Err(NoteRepoError::MissingDeleteTokenHash)));
    }

    #[tokio::test]
    async fn create_then_update_keeps_original_hash() {
        let repo = InMemoryNoteRepo::new();
        let owner = DeleteToken::generate().expect("rng").hash();
        let other = DeleteToken::generate().expect("rng").hash();

        let created = repo.save(save("shared", Some(owner.clone()))).await.expect("create");
        assert!(matches!(created, SaveOutcome::Created(_)));

        let mut update = save("shared", Some(other));
        update.has_user_password = true;
        let updated = repo.save(update).await.expect("update");
        assert!(matches!(updated, SaveOutcome::Updated(_)));

        let record = updated.record();
        assert_eq!(record.delete_token_hash, owner);
        assert!(record.has_user_password);
        assert_eq!(record.created_at, created.record().created_at);
        assert!(record.updated_at >= record.created_at);
    }

    #[tokio::test]
    async fn update_without_hash_is_allowed() {
        let repo = InMemoryNoteRepo::new();
        let owner = DeleteToken::generate().expect("rng").hash();
        repo.save(save("doc", Some(owner))).await.expect("create");
        let outcome = repo.save(save("doc", None)).await.expect("update");
        assert!(matches!(outcome, SaveOutcome::Updated(_)));
    }

    #[tokio::test]
    async fn last_write_wins() {
        let repo = InMemoryNoteRepo::new();
        let owner = DeleteToken::generate().expect("rng").hash();
        repo.save(save("doc", Some(owner))).await.expect("create");

        let second = save("doc", None);
        let expected = second.envelope.clone();
        repo.save(second).await.expect("update");

        let name = NoteName::parse("doc").expect("valid name");
        let record = repo.get(&name).await.expect("get");
        assert_eq!(record.envelope, expected);
    }

    #[tokio::test]
    async fn delete_with_owner_token_removes_note() {
        let repo = InMemoryNoteRepo::new();
        let owner = DeleteToken::generate().expect("rng");
        repo.save(save("gone", Some(owner.hash()))).await.expect("create");

        let name = NoteName::parse("gone").expect("valid name");
        repo.delete(&name, Some(owner.as_str())).await.expect("delete");
        assert!(matches!(repo.get(&name).await, Err(NoteRepoError::NotFound)));
        assert!(matches!(
            repo.delete(&name, Some(owner.as_str())).await,
            Err(NoteRepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_rejects_missing_and_wrong_tokens() {
        let repo = InMemoryNoteRepo::new();
        let owner = DeleteToken::generate().expect("rng");
        let other = DeleteToken::generate().expect("rng");
        repo.save(save("kept", Some(owner.hash()))).await.expect("create");

        let name = NoteName::parse("kept").expect("valid name");
        for token in [None, Some(""), Some(other.as_str())] {
            assert!(matches!(
                repo.delete(&name, token).await,
                Err(NoteRepoError::Unauthorized)
            ));
        }
        assert!(repo.get(&name).await.is_ok());
    }

    #[tokio::test]
    async fn stale_token_cannot_delete_recreated_note() {
        let repo = InMemoryNoteRepo::new();
        let first_owner = DeleteToken::generate().expect("rng");
        let second_owner = DeleteToken::generate().expect("rng");
        let name = NoteName::parse("reused").expect("valid name");

        repo.save(save("reused", Some(first_owner.hash())))
            .await
            .expect("create");
        repo.delete(&name, Some(first_owner.as_str()))
            .await
            .expect("delete");
        repo.save(save("reused", Some(second_owner.hash())))
            .await
            .expect("re-create");

        assert!(matches!(
            repo.delete(&name, Some(first_owner.as_str())).await,
            Err(NoteRepoError::Unauthorized)
        ));
        let record = repo.get(&name).await.expect("still present");
        assert_eq!(record.delete_token_hash, second_owner.hash());
    }
}

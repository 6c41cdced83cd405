//! Encrypted note storage.
//!
//! Routes, handlers and the repository for opaque note envelopes.

pub mod http;
pub mod repo;

use axum::{routing::get, Router};

pub use repo::{InMemoryNoteRepo, NoteRecord, NoteRepo, NoteRepoError, SaveNote, SaveOutcome};

#[cfg(any(test, feature = "test-utils"))]
pub use repo::mock;

/// Notes router. Expects `Extension<Arc<dyn NoteRepo>>` and
/// `Extension<NotesConfig>` layers.
#[must_use]
pub fn router() -> Router {
    Router::new().route(
        "/api/notes/{name}",
        get(http::get_note)
            .put(http::put_note)
            .delete(http::delete_note),
    )
}

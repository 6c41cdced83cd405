//! HTTP handlers for the notes API.
//!
//! The server is store-and-forward: it validates envelope shape and size,
//! stores envelopes by name, and enforces the delete-token check. It never
//! decrypts anything.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zn_crypto::{DeleteTokenHash, Envelope, NoteName, WireEnvelope};

use super::repo::{NoteRecord, NoteRepo, NoteRepoError, SaveNote, SaveOutcome};
use crate::config::NotesConfig;
use crate::http::{bad_request, error_response, internal_error};

const CANNOT_DELETE: &str = "Cannot delete note";
const NOT_FOUND: &str = "Note not found";
const TOO_LARGE: &str = "Note too large";

/// Public view of a stored note. Never includes the delete-token hash.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub name: NoteName,
    pub envelope: Envelope,
    pub has_user_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NoteRecord> for NoteResponse {
    fn from(record: NoteRecord) -> Self {
        Self {
            name: record.name,
            envelope: record.envelope,
            has_user_password: record.has_user_password,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutNoteRequest {
    pub envelope: WireEnvelope,
    #[serde(default)]
    pub delete_token_hash: Option<String>,
    #[serde(default)]
    pub has_user_password: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNoteRequest {
    #[serde(default)]
    pub delete_token: Option<String>,
}

fn parse_name(raw: &str) -> Result<NoteName, axum::response::Response> {
    NoteName::parse(raw).map_err(|e| bad_request(&e.to_string()))
}

fn rejection_response(rejection: &JsonRejection) -> axum::response::Response {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        error_response(StatusCode::PAYLOAD_TOO_LARGE, TOO_LARGE)
    } else {
        bad_request("Invalid request body")
    }
}

fn repo_error_response(e: NoteRepoError, op: &str) -> axum::response::Response {
    match e {
        NoteRepoError::NotFound => error_response(StatusCode::NOT_FOUND, NOT_FOUND),
        NoteRepoError::Unauthorized => error_response(StatusCode::FORBIDDEN, CANNOT_DELETE),
        NoteRepoError::MissingDeleteTokenHash => {
            bad_request("deleteTokenHash is required when creating a note")
        }
        NoteRepoError::Storage(msg) => {
            tracing::error!(op, "note repository failure: {msg}");
            internal_error()
        }
    }
}

/// GET /api/notes/{name}
pub async fn get_note(
    Extension(repo): Extension<Arc<dyn NoteRepo>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let name = match parse_name(&name) {
        Ok(n) => n,
        Err(resp) => return resp,
    };

    match repo.get(&name).await {
        Ok(record) => (StatusCode::OK, Json(NoteResponse::from(record))).into_response(),
        Err(e) => repo_error_response(e, "get"),
    }
}

/// PUT /api/notes/{name}: create (201) or overwrite (200).
pub async fn put_note(
    Extension(repo): Extension<Arc<dyn NoteRepo>>,
    Extension(limits): Extension<NotesConfig>,
    Path(name): Path<String>,
    body: Result<Json<PutNoteRequest>, JsonRejection>,
) -> impl IntoResponse {
    let name = match parse_name(&name) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(&rejection),
    };

    let envelope = match Envelope::try_from(req.envelope) {
        Ok(envelope) => envelope,
        Err(zn_crypto::EnvelopeError::TooLarge { .. }) => {
            return error_response(StatusCode::PAYLOAD_TOO_LARGE, TOO_LARGE)
        }
        Err(e) => return bad_request(&format!("Invalid envelope: {e}")),
    };
    if envelope.encoded_ciphertext_len() > limits.max_envelope_bytes {
        return error_response(StatusCode::PAYLOAD_TOO_LARGE, TOO_LARGE);
    }

    let delete_token_hash = match req
        .delete_token_hash
        .as_deref()
        .map(str::parse::<DeleteTokenHash>)
    {
        None => None,
        Some(Ok(hash)) => Some(hash),
        Some(Err(e)) => return bad_request(&e.to_string()),
    };

    let save = SaveNote {
        name,
        envelope,
        has_user_password: req.has_user_password,
        delete_token_hash,
    };

    let outcome = match repo.save(save).await {
        Ok(outcome) => outcome,
        Err(e) => return repo_error_response(e, "save"),
    };
    let created = matches!(outcome, SaveOutcome::Created(_));
    tracing::info!(note = %outcome.record().name, created, "note saved");

    let (status, record) = match outcome {
        SaveOutcome::Created(record) => (StatusCode::CREATED, record),
        SaveOutcome::Updated(record) => (StatusCode::OK, record),
    };
    (status, Json(NoteResponse::from(record))).into_response()
}

/// DELETE /api/notes/{name}
///
/// Missing, malformed and wrong tokens get the same 403 so a caller learns
/// nothing beyond "not authorized".
pub async fn delete_note(
    Extension(repo): Extension<Arc<dyn NoteRepo>>,
    Path(name): Path<String>,
    body: Result<Json<DeleteNoteRequest>, JsonRejection>,
) -> impl IntoResponse {
    let name = match parse_name(&name) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    let token = body.ok().and_then(|Json(req)| req.delete_token);

    match repo.delete(&name, token.as_deref()).await {
        Ok(()) => {
            tracing::info!(note = %name, "note deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(NoteRepoError::Unauthorized) => {
            tracing::warn!(note = %name, "rejected delete");
            error_response(StatusCode::FORBIDDEN, CANNOT_DELETE)
        }
        Err(e) => repo_error_response(e, "delete"),
    }
}

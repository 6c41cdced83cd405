//! Client-side cryptography for `ZeroNote`
//!
//! Notes are encrypted in the browser (this crate compiled to WASM) and the
//! server only ever stores opaque envelopes. The same crate is used natively
//! by the server to validate envelope shape and verify delete tokens.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
pub(crate) use sha2::{Digest, Sha256};
use wasm_bindgen::prelude::*;

pub mod cipher;
pub mod delete_token;
pub mod envelope;
pub mod kdf;
pub mod name;
pub mod note;
pub mod random;
pub mod token_store;
pub mod unlock;
pub mod vault;

pub use delete_token::{hash_token, verify, DeleteToken, DeleteTokenHash, TokenHashError};
pub use envelope::{Envelope, EnvelopeError, WireEnvelope, MAX_ENCODED_CIPHERTEXT};
pub use name::{NameError, NoteName};
pub use note::{NoteContent, NoteContentError, Tab};
pub use token_store::{DeleteAuthority, MemoryTokenStore, TokenError, TokenStore};
pub use unlock::{UnlockState, UnlockedNote};
pub use vault::{open_note, open_note_json, seal_note, Passphrase, UserOutcome, VaultError};

/// Error type for base64 decoding failures
#[derive(Debug, thiserror::Error)]
#[error("invalid base64 encoding: {0}")]
pub struct DecodeError(#[from] base64::DecodeError);

/// Encode bytes as standard base64 with padding (the envelope encoding).
#[must_use]
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64 with padding.
///
/// # Errors
/// Returns `DecodeError` if the input is not valid base64
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD.decode(encoded).map_err(DecodeError::from)
}

/// Encode bytes as base64url (RFC 4648) without padding.
#[must_use]
pub fn encode_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn passphrase_from(password: Option<String>) -> Passphrase {
    password.map_or_else(Passphrase::unprotected, Passphrase::user)
}

/// Encrypt note JSON into envelope JSON (WASM binding).
///
/// `password` of `None` seals with the no-password sentinel.
///
/// # Errors
/// Returns `JsError` if the note JSON is invalid or sealing fails
#[wasm_bindgen(js_name = "encryptNote")]
pub fn encrypt_note(note_json: &str, password: Option<String>) -> Result<String, JsError> {
    let note: NoteContent = serde_json::from_str(note_json)
        .map_err(|_| JsError::new("invalid note content"))?;
    let envelope = seal_note(&note, &passphrase_from(password))
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(envelope.to_json())
}

/// Decrypt envelope JSON into note JSON (WASM binding).
///
/// # Errors
/// Returns `JsError` carrying only the user-facing failure category
#[wasm_bindgen(js_name = "decryptNote")]
pub fn decrypt_note(envelope_json: &str, password: Option<String>) -> Result<String, JsError> {
    let note = open_note_json(envelope_json, &passphrase_from(password))
        .map_err(|e| JsError::new(&format!("{:?}", e.user_outcome())))?;
    serde_json::to_string(&note).map_err(|_| JsError::new("Unreadable"))
}

/// Generate a fresh delete token (WASM binding).
///
/// # Errors
/// Returns `JsError` if no secure randomness is available
#[wasm_bindgen(js_name = "generateDeleteToken")]
pub fn generate_delete_token() -> Result<String, JsError> {
    DeleteToken::generate()
        .map(|t| t.as_str().to_string())
        .map_err(|e| JsError::new(&e.to_string()))
}

/// Hash a delete token for the create request (WASM binding).
#[wasm_bindgen(js_name = "hashDeleteToken")]
#[must_use]
pub fn hash_delete_token(token: &str) -> String {
    hash_token(token).to_string()
}

/// Normalize a note name, or `None` if it is invalid (WASM binding).
#[wasm_bindgen(js_name = "normalizeNoteName")]
#[must_use]
pub fn normalize_note_name(input: &str) -> Option<String> {
    NoteName::parse(input).ok().map(|n| n.as_str().to_string())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Envelope base64 is lossless for any byte sequence
        #[test]
        fn roundtrip_encode_decode(bytes: Vec<u8>) {
            let decoded = decode_base64(&encode_base64(&bytes)).unwrap();
            prop_assert_eq!(decoded, bytes);
        }

        /// Encoded output contains only valid base64url characters
        #[test]
        fn encode_produces_valid_base64url_chars(bytes: Vec<u8>) {
            let encoded = encode_base64url(&bytes);
            prop_assert!(encoded.chars().all(|c|
                c.is_ascii_alphanumeric() || c == '-' || c == '_'
            ));
        }
    }
}

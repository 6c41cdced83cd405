//! Common test utilities for integration tests.
//!
//! - [`app_builder::TestAppBuilder`] - Build test Axum apps that mirror main.rs wiring
//! - [`fixtures`] - Sealed envelopes, delete tokens and request helpers
//!
//! ```ignore
//! use crate::common::app_builder::TestAppBuilder;
//!
//! #[tokio::test]
//! async fn test_with_app() {
//!     let app = TestAppBuilder::in_memory().build();
//!     // Use app.oneshot(...) to send requests
//! }
//! ```

#![allow(dead_code)]

pub mod app_builder;

pub mod fixtures {
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Method, Request},
        response::Response,
    };
    use serde_json::Value;
    use zn_crypto::{seal_note, DeleteToken, Envelope, NoteContent, Passphrase};

    pub const NOW_MS: i64 = 1_700_000_000_000;

    /// A note with one tab holding `text`.
    pub fn note(text: &str) -> NoteContent {
        let mut note = NoteContent::new(NOW_MS).expect("rng");
        note.update_tab(0, "", text, NOW_MS).expect("tab 0 exists");
        note
    }

    pub fn sealed(text: &str, password: Option<&str>) -> Envelope {
        let passphrase = password.map_or_else(Passphrase::unprotected, Passphrase::user);
        seal_note(&note(text), &passphrase).expect("seal")
    }

    pub fn token() -> DeleteToken {
        DeleteToken::generate().expect("rng")
    }

    pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    pub fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    pub async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }
}

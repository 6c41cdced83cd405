//! Test app builder that mirrors main.rs wiring with injectable deps/mocks.
//!
//! Routes and layers come from [`zeronote_api::app::build_app`], the same
//! function `main.rs` calls; the builder only decides which [`Config`] and
//! which [`NoteRepo`] are handed to it.
//!
//! ```ignore
//! use crate::common::app_builder::TestAppBuilder;
//!
//! #[tokio::test]
//! async fn test_with_full_app() {
//!     let app = TestAppBuilder::in_memory()
//!         .with_cors(&["http://localhost:5173"])
//!         .build();
//!
//!     // Use app.oneshot(...) to send requests
//! }
//! ```
//!
//! # Preset Builders
//!
//! - [`TestAppBuilder::minimal()`] - Default config, in-memory repo, no security headers
//! - [`TestAppBuilder::in_memory()`] - Production-like app over a fresh in-memory repo
//! - [`TestAppBuilder::with_mock_repo()`] - Production-like app over a [`MockNoteRepo`]

use std::sync::Arc;

use axum::Router;
use zeronote_api::{
    app::build_app,
    config::{Config, SecurityHeadersConfig},
    notes::{mock::MockNoteRepo, InMemoryNoteRepo, NoteRepo},
};

/// Builder for test applications.
pub struct TestAppBuilder {
    config: Config,
    repo: Arc<dyn NoteRepo>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppBuilder {
    /// Default config over an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            repo: Arc::new(InMemoryNoteRepo::new()),
        }
    }

    // =========================================================================
    // Preset Builders
    // =========================================================================

    /// Bare routes: no security headers, no CORS origins.
    #[must_use]
    pub fn minimal() -> Self {
        Self::new().without_security_headers()
    }

    /// Production-like wiring over a fresh in-memory repository.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new()
    }

    /// Production-like wiring over a mock repository the test controls.
    #[must_use]
    pub fn with_mock_repo(repo: Arc<MockNoteRepo>) -> Self {
        Self::new().with_repo(repo)
    }

    // =========================================================================
    // Configuration Methods
    // =========================================================================

    #[must_use]
    pub fn with_repo(mut self, repo: Arc<dyn NoteRepo>) -> Self {
        self.repo = repo;
        self
    }

    #[must_use]
    pub fn with_cors(mut self, origins: &[&str]) -> Self {
        self.config.cors.allowed_origins = origins.iter().map(|s| (*s).to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_security_headers(mut self, config: SecurityHeadersConfig) -> Self {
        self.config.security_headers = config;
        self
    }

    #[must_use]
    pub fn without_security_headers(mut self) -> Self {
        self.config.security_headers.enabled = false;
        self
    }

    #[must_use]
    pub fn with_max_envelope_bytes(mut self, max: usize) -> Self {
        self.config.notes.max_envelope_bytes = max;
        self
    }

    /// Build the router.
    ///
    /// # Panics
    ///
    /// Panics if the assembled configuration does not validate.
    #[must_use]
    pub fn build(self) -> Router {
        self.config.validate().expect("test config should be valid");
        build_app(&self.config, self.repo)
    }
}

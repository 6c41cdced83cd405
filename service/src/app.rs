//! Router assembly shared by `main.rs` and the integration tests.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Extension, Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::http::{build_security_headers, security_headers_middleware};
use crate::notes::{self, NoteRepo};

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Build the CORS origin policy from configured origins.
#[must_use]
pub fn allow_origin(origins: &[String]) -> AllowOrigin {
    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow any origin - not recommended for production");
        AllowOrigin::any()
    } else if origins.is_empty() {
        tracing::info!("CORS allowed origins not configured - cross-origin requests will be blocked");
        AllowOrigin::list(Vec::<HeaderValue>::new())
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        tracing::info!(origins = ?origins, "CORS allowed origins configured");
        AllowOrigin::list(parsed)
    }
}

/// Build the full application router.
#[must_use]
pub fn build_app(config: &Config, repo: Arc<dyn NoteRepo>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_check))
        .merge(notes::router())
        .layer(Extension(repo))
        .layer(Extension(config.notes.clone()))
        .layer(DefaultBodyLimit::max(config.notes.body_limit()))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any)
                .allow_origin(allow_origin(&config.cors.allowed_origins)),
        )
        .layer(TraceLayer::new_for_http());

    if config.security_headers.enabled {
        tracing::info!("Security headers enabled");
        app = app
            .layer(middleware::from_fn(security_headers_middleware))
            .layer(Extension(build_security_headers(&config.security_headers)));
    } else {
        tracing::info!("Security headers disabled");
    }

    app
}

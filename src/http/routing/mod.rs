use axum::{routing::get, Router};

use crate::http::types::ApiError;

/// Wraps the resource routers with a liveness probe and a JSON 404 for unknown paths.
pub fn app(router: Router) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(router)
        .fallback(|| async { ApiError::not_found() })
}

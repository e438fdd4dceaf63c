//! Health check endpoint.
//!
//! Used by load balancers and monitoring systems to verify a listener is up.
//! This endpoint does not check dependencies.

use axum::http::StatusCode;

/// Simple liveness check. Returns 200 OK with a plain body.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

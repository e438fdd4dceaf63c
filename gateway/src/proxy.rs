//! Streaming proxy handler.
//!
//! Bodies are streamed in both directions and never fully buffered, so
//! memory stays bounded for large payloads. If the caller disconnects
//! mid-request, Axum drops the handler future, which cancels the in-flight
//! upstream call instead of letting it run to completion.

use crate::routes::RouteTable;
use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    response::Response,
    routing::get,
};
use http::header::{CONTENT_LENGTH, HOST, HeaderName};
use orderwire_web::{AppError, health_check};
use std::sync::Arc;

/// Shared state for the proxy handler.
#[derive(Clone)]
pub struct GatewayState {
    table: Arc<RouteTable>,
    client: reqwest::Client,
}

/// Create the gateway router around a routing table.
///
/// Every path except `/health` falls through to the proxy; paths that do not
/// match the table return 404.
pub fn gateway_router(table: RouteTable) -> Router {
    let state = GatewayState {
        table: Arc::new(table),
        client: reqwest::Client::new(),
    };

    Router::new()
        .route("/health", get(health_check))
        .fallback(proxy)
        .with_state(state)
}

/// Hop-by-hop headers, meaningful only for a single transport link and never
/// forwarded by the proxy (RFC 9110 section 7.6.1).
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Forward a request to the backend mapped by the routing table.
///
/// # Errors
///
/// - 404 if no route prefix matches the path.
/// - 502 if the backend is entirely unreachable. A backend that responds
///   with an error status is not an error here: its status and body are
///   forwarded verbatim.
async fn proxy(State(state): State<GatewayState>, request: Request) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();
    let Some(upstream) = state.table.resolve(&path) else {
        tracing::debug!(path = %path, "No route for path");
        return Err(AppError::not_found("Route", &path));
    };

    let query = request
        .uri()
        .query()
        .map(|q| format!("?{q}"))
        .unwrap_or_default();
    let target = format!("{upstream}{path}{query}");

    let (parts, body) = request.into_parts();
    tracing::debug!(method = %parts.method, url = %target, "Forwarding request");

    let mut outbound = state.client.request(parts.method, target.as_str());
    for (name, value) in &parts.headers {
        // Host is regenerated for the upstream connection, and the streamed
        // body is re-framed, so its original length header does not apply.
        if is_hop_by_hop(name) || name == &HOST || name == &CONTENT_LENGTH {
            continue;
        }
        outbound = outbound.header(name, value);
    }

    let upstream_response = outbound
        .body(reqwest::Body::wrap_stream(body.into_data_stream()))
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(url = %target, error = %e, "Backend unreachable");
            AppError::bad_gateway(format!("backend unreachable: {e}"))
        })?;

    let mut response = Response::builder().status(upstream_response.status());
    for (name, value) in upstream_response.headers() {
        if !is_hop_by_hop(name) {
            response = response.header(name, value);
        }
    }

    response
        .body(Body::from_stream(upstream_response.bytes_stream()))
        .map_err(|e| AppError::internal("failed to assemble response").with_source(e.into()))
}

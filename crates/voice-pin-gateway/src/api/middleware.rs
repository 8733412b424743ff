//! Authentication and logging middleware.

use super::AppState;
use crate::error::GatewayError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// API key middleware.
///
/// Rejects requests whose `x-api-key` header does not match the configured key.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if key == state.api_key.expose_secret().as_str() => {
            debug!("API key accepted");
            Ok(next.run(request).await)
        }
        _ => {
            warn!(uri = %request.uri(), "Rejected request with missing or invalid API key");
            Err(GatewayError::Unauthorized)
        }
    }
}

/// Paths the voice gateway calls back on during a call.
const WEBHOOK_PATHS: [&str; 3] = ["/voice", "/verify", "/timeout"];

/// Log each request with its latency.
///
/// Failed gateway webhooks log at error level, other failures at warn.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let webhook = WEBHOOK_PATHS.contains(&path.as_str());
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match (status.is_success(), webhook) {
        (true, _) => debug!(%method, %path, %status, elapsed_ms, webhook, "Request handled"),
        (false, true) => error!(%method, %path, %status, elapsed_ms, "Gateway webhook failed"),
        (false, false) => warn!(%method, %path, %status, elapsed_ms, "Request failed"),
    }

    response
}

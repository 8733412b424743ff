//! HTTP API for the voice PIN gateway.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{logging_middleware, require_api_key, API_KEY_HEADER};
pub use types::*;

use crate::flow::CallFlow;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use secrecy::SecretString;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Call flow controller, which owns the session registry
    pub flow: CallFlow,
    /// Key required by the session and inspection endpoints
    pub api_key: Arc<SecretString>,
}

impl AppState {
    /// Create new application state.
    pub fn new(flow: CallFlow, api_key: SecretString) -> Self {
        Self {
            flow,
            api_key: Arc::new(api_key),
        }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    // Session management (API key required)
    let admin = Router::new()
        .route("/session", post(handlers::create_session))
        .route("/sessions", get(handlers::list_sessions))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    // Voice gateway webhooks
    let gateway = Router::new()
        .route("/voice", post(handlers::voice))
        .route("/verify", post(handlers::verify))
        .route("/timeout", post(handlers::timeout));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(admin)
        .merge(gateway)
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

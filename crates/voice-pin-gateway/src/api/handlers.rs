//! HTTP request handlers.

use super::types::{CreateSessionRequest, CreateSessionResponse, GatewayForm, HealthResponse};
use super::AppState;
use crate::error::GatewayError;
use crate::flow::{CallEvent, FlowStep};
use crate::registry::SessionSummary;
use crate::twiml;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};
use tracing::info;

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        session_count: state.flow.registry().count().await,
    })
}

/// Open a verification session for a phone number.
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, GatewayError> {
    let (Some(phone), Some(url), Some(secret)) = (request.phone, request.url, request.secret) else {
        return Err(GatewayError::InvalidInput(
            "Missing required fields: phone, url, secret".into(),
        ));
    };

    let id = state.flow.registry().create(&phone, &url, &secret).await?;
    Ok(Json(CreateSessionResponse { id }))
}

/// List all sessions for inspection.
pub async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionSummary>> {
    Json(state.flow.registry().list_all().await)
}

/// Inbound call webhook.
pub async fn voice(
    State(state): State<AppState>,
    Form(form): Form<GatewayForm>,
) -> Result<Response, GatewayError> {
    let phone = form.caller().ok_or(GatewayError::MissingParameter("From"))?;
    info!(phone = %phone, "Incoming call");

    let step = state
        .flow
        .handle(CallEvent::CallStarted {
            phone: phone.to_string(),
        })
        .await;
    markup(step)
}

/// Captured PIN webhook.
pub async fn verify(
    State(state): State<AppState>,
    Form(form): Form<GatewayForm>,
) -> Result<Response, GatewayError> {
    let phone = form.caller().ok_or(GatewayError::MissingParameter("From"))?;

    let step = state
        .flow
        .handle(CallEvent::CodeCaptured {
            phone: phone.to_string(),
            input: form.captured_input(),
        })
        .await;
    markup(step)
}

/// Capture window elapsed webhook.
pub async fn timeout(
    State(state): State<AppState>,
    Form(form): Form<GatewayForm>,
) -> Result<Response, GatewayError> {
    let phone = form.caller().ok_or(GatewayError::MissingParameter("From"))?;

    let step = state
        .flow
        .handle(CallEvent::CaptureTimeout {
            phone: phone.to_string(),
        })
        .await;
    markup(step)
}

fn markup(step: FlowStep) -> Result<Response, GatewayError> {
    let xml = twiml::render(&step.directive)?;
    Ok(([(header::CONTENT_TYPE, twiml::CONTENT_TYPE)], xml).into_response())
}

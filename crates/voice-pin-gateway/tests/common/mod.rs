//! Common test utilities for integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use voice_pin_gateway::{
    api::{create_router, AppState, API_KEY_HEADER},
    CallFlow, MerchantClient, SessionRegistry,
};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wiremock::matchers::method;

pub const API_KEY: &str = "test-api-key";
pub const PHONE: &str = "+48123456789";

/// Call flow backed by a real merchant client.
pub fn test_flow(registry: SessionRegistry) -> CallFlow {
    let merchant = MerchantClient::new(Duration::from_secs(5)).unwrap();
    CallFlow::new(registry, Arc::new(merchant))
}

/// Router over the given registry.
pub fn test_app(registry: SessionRegistry) -> Router {
    let state = AppState::new(test_flow(registry), SecretString::new(API_KEY.to_string()));
    create_router(state)
}

/// Start a merchant endpoint answering every POST with `status` and `body`.
pub async fn mock_merchant(status: u16, body: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;
    server
}

/// Form-encoded POST as sent by the voice gateway.
pub fn gateway_request(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

/// Authenticated JSON POST.
pub fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(API_KEY_HEADER, API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// `From` form field for the test phone.
pub fn from_field() -> String {
    format!("From={}", PHONE.replace('+', "%2B"))
}

pub async fn body_string(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

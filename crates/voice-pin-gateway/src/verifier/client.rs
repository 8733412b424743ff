//! HTTP client for merchant verification endpoints.

use super::{classify_response, VerificationOutcome, Verifier};
use crate::error::GatewayError;
use crate::registry::{SessionId, SessionStatus, VerificationSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default merchant request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Body posted to the merchant endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPayload<'a> {
    pub id: SessionId,
    pub phone: &'a str,
    pub url: &'a str,
    pub secret: &'a str,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub code: &'a str,
}

impl<'a> VerifyPayload<'a> {
    pub fn new(session: &'a VerificationSession, code: &'a str) -> Self {
        Self {
            id: session.id,
            phone: &session.phone,
            url: &session.callback_url,
            secret: &session.secret,
            status: session.status,
            created_at: session.created_at,
            code,
        }
    }
}

/// Posts captured PINs to the merchant registered on each session.
#[derive(Clone)]
pub struct MerchantClient {
    client: Client,
}

impl MerchantClient {
    /// Create a new merchant client with a bounded request timeout.
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Verifier for MerchantClient {
    #[instrument(skip(self, session, code), fields(session_id = %session.id, phone = %session.phone))]
    async fn verify(&self, session: &VerificationSession, code: &str) -> VerificationOutcome {
        let payload = VerifyPayload::new(session, code);

        debug!(url = %session.callback_url, "Sending verification request");

        let response = match self
            .client
            .post(session.callback_url.as_str())
            .json(&payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Merchant request failed");
                return VerificationOutcome::Error(e.to_string());
            }
        };

        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!(status, error = %e, "Failed to read merchant response body");
                return VerificationOutcome::Error(e.to_string());
            }
        };

        let outcome = classify_response(status, &body);
        debug!(status, outcome = outcome.kind(), "Merchant responded");
        outcome
    }
}

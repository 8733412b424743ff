//! Merchant PIN verification.

mod client;

pub use client::{MerchantClient, VerifyPayload};

use crate::registry::VerificationSession;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

/// Payment error codes reported by merchants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentErrorCode {
    /// Premium-rate services are disabled on the subscriber's line
    PremiumServicesDisabled,
    /// Carrier billing amount limit reached
    AmountLimitExceeded,
    /// Any other code, kept verbatim
    Other(String),
}

impl PaymentErrorCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "DCB_DISABLED_PREMIUM_SERVICES" => PaymentErrorCode::PremiumServicesDisabled,
            "AMOUNT_LIMIT_EXCEEDED" => PaymentErrorCode::AmountLimitExceeded,
            other => PaymentErrorCode::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentErrorCode::PremiumServicesDisabled => "DCB_DISABLED_PREMIUM_SERVICES",
            PaymentErrorCode::AmountLimitExceeded => "AMOUNT_LIMIT_EXCEEDED",
            PaymentErrorCode::Other(code) => code,
        }
    }
}

impl fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified result of a merchant verification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// PIN accepted and payment completed
    Success,
    /// PIN accepted but the payment was refused; terminal
    PaymentError { code: PaymentErrorCode },
    /// Merchant rejected the PIN
    InvalidPin,
    /// Merchant failed internally
    InternalError,
    /// Merchant could not be reached
    Error(String),
}

impl VerificationOutcome {
    /// Whether the caller should be prompted for the PIN again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VerificationOutcome::InvalidPin
                | VerificationOutcome::InternalError
                | VerificationOutcome::Error(_)
        )
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            VerificationOutcome::Success => "success",
            VerificationOutcome::PaymentError { .. } => "payment_error",
            VerificationOutcome::InvalidPin => "invalid_pin",
            VerificationOutcome::InternalError => "internal_error",
            VerificationOutcome::Error(_) => "transport_error",
        }
    }
}

/// Body returned by a merchant endpoint.
#[derive(Debug, Default, Deserialize)]
struct MerchantResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    code: Option<String>,
}

/// Map a merchant status code and body to an outcome.
///
/// A 200 without `success: true` is a payment error; its code defaults to `UNKNOWN`.
pub fn classify_response(status: u16, body: &[u8]) -> VerificationOutcome {
    match status {
        200 => {
            let parsed: MerchantResponse = serde_json::from_slice(body).unwrap_or_default();
            if parsed.success == Some(true) {
                VerificationOutcome::Success
            } else {
                let code = parsed.code.unwrap_or_else(|| "UNKNOWN".to_string());
                VerificationOutcome::PaymentError {
                    code: PaymentErrorCode::parse(&code),
                }
            }
        }
        400 => VerificationOutcome::InvalidPin,
        500 => VerificationOutcome::InternalError,
        _ => VerificationOutcome::InvalidPin,
    }
}

/// Verifies a captured PIN against the session's merchant.
///
/// Implementations never fail: transport problems become [`VerificationOutcome::Error`].
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, session: &VerificationSession, code: &str) -> VerificationOutcome;
}

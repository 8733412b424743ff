//! Verification session registry.

mod memory;

pub use memory::{EvictionReport, SessionRegistry};

use crate::error::RegistryError;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum length of a phone number, including the leading `+`.
pub const MIN_PHONE_LEN: usize = 8;

/// Session identifier.
pub type SessionId = Uuid;

/// Lifecycle state of a verification session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Awaiting a correct PIN from the caller
    Pending,
    /// Merchant confirmed the PIN
    Verified,
}

/// A phone verification session.
#[derive(Debug, Clone)]
pub struct VerificationSession {
    pub id: SessionId,

    /// Phone number of the expected caller (e.g., "+48123456789")
    pub phone: String,

    /// Merchant endpoint that verifies the captured PIN, kept as registered
    pub callback_url: String,

    /// Opaque token forwarded to the merchant
    pub secret: String,

    pub status: SessionStatus,

    pub created_at: DateTime<Utc>,

    /// Retryable verification failures so far
    pub attempts: u32,
}

impl VerificationSession {
    /// Create a new pending session after validating its fields.
    pub fn new_pending(phone: &str, callback_url: &str, secret: &str) -> Result<Self, RegistryError> {
        if phone.is_empty() || callback_url.is_empty() || secret.is_empty() {
            return Err(RegistryError::InvalidInput(
                "Missing required fields: phone, url, secret".into(),
            ));
        }

        validate_phone(phone)?;
        parse_callback_url(callback_url)?;

        Ok(Self {
            id: Uuid::new_v4(),
            phone: phone.to_string(),
            callback_url: callback_url.to_string(),
            secret: secret.to_string(),
            status: SessionStatus::Pending,
            created_at: Utc::now(),
            attempts: 0,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == SessionStatus::Pending
    }

    /// Public view of the session for inspection.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            phone: self.phone.clone(),
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// Session fields exposed by the inspection API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    pub phone: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

/// Check that a phone number looks like E.164: leading `+`, at least 8 characters.
pub fn validate_phone(phone: &str) -> Result<(), RegistryError> {
    if !phone.starts_with('+') || phone.len() < MIN_PHONE_LEN {
        return Err(RegistryError::InvalidInput(format!(
            "Invalid phone number format. Must start with + and be at least {} characters",
            MIN_PHONE_LEN
        )));
    }
    Ok(())
}

/// Parse the merchant callback as an absolute URL.
pub fn parse_callback_url(url: &str) -> Result<Url, RegistryError> {
    let parsed =
        Url::parse(url).map_err(|e| RegistryError::InvalidInput(format!("Invalid URL format: {}", e)))?;

    if parsed.cannot_be_a_base() {
        return Err(RegistryError::InvalidInput(
            "Invalid URL format: not a hierarchical URL".into(),
        ));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+48123456789").is_ok());
        assert!(validate_phone("+1234567").is_ok());

        assert!(validate_phone("+123456").is_err());
        assert!(validate_phone("48123456789").is_err());
        assert!(validate_phone("").is_err());
        assert!(validate_phone("0048123456789").is_err());
    }

    #[test]
    fn test_phone_validation_iff_property() {
        let candidates = [
            "+", "+1", "+123456", "+1234567", "+12345678", "1234567890", "++++++++", "+abcdefg",
            "x+48123456",
        ];
        for phone in candidates {
            let expected_invalid = !phone.starts_with('+') || phone.len() < MIN_PHONE_LEN;
            assert_eq!(validate_phone(phone).is_err(), expected_invalid, "phone: {phone}");
        }
    }

    #[test]
    fn test_parse_callback_url() {
        assert!(parse_callback_url("https://merchant.example.com/verify").is_ok());
        assert!(parse_callback_url("http://localhost:3001?test=success").is_ok());

        assert!(parse_callback_url("/relative/path").is_err());
        assert!(parse_callback_url("not a url").is_err());
        assert!(parse_callback_url("mailto:ops@example.com").is_err());
    }

    #[test]
    fn test_new_pending_requires_fields() {
        let err = VerificationSession::new_pending("", "https://m.example.com", "s").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidInput(_)));

        let err = VerificationSession::new_pending("+48123456789", "https://m.example.com", "")
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidInput(_)));

        let session =
            VerificationSession::new_pending("+48123456789", "https://m.example.com/cb", "s3cret")
                .unwrap();
        assert_eq!(session.status, SessionStatus::Pending);
        assert_eq!(session.attempts, 0);
        assert_eq!(session.callback_url, "https://m.example.com/cb");
    }

    #[test]
    fn test_callback_url_kept_as_registered() {
        let session = VerificationSession::new_pending(
            "+48123456789",
            "http://localhost:3001?test=success",
            "s",
        )
        .unwrap();
        assert_eq!(session.callback_url, "http://localhost:3001?test=success");
    }

    #[test]
    fn test_session_status_serialization() {
        let json = serde_json::to_string(&SessionStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");

        let json = serde_json::to_string(&SessionStatus::Verified).unwrap();
        assert_eq!(json, "\"verified\"");
    }

    #[test]
    fn test_summary_serialization() {
        let session =
            VerificationSession::new_pending("+48123456789", "https://m.example.com", "secret")
                .unwrap();
        let json = serde_json::to_value(session.summary()).unwrap();

        assert_eq!(json["phone"], "+48123456789");
        assert_eq!(json["status"], "pending");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("secret").is_none());
    }
}

//! API request and response types.

use crate::pin::CapturedInput;
use crate::registry::SessionId;
use serde::{Deserialize, Serialize};

/// Request to open a verification session.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Caller phone number in E.164 format
    pub phone: Option<String>,

    /// Merchant verification endpoint
    pub url: Option<String>,

    /// Opaque token forwarded to the merchant
    pub secret: Option<String>,
}

/// Response after creating a session.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub id: SessionId,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub session_count: usize,
}

/// Form fields posted by the voice gateway.
#[derive(Debug, Default, Deserialize)]
pub struct GatewayForm {
    #[serde(rename = "From")]
    pub from: Option<String>,

    #[serde(rename = "Digits")]
    pub digits: Option<String>,

    #[serde(rename = "SpeechResult")]
    pub speech_result: Option<String>,

    /// Recognizer confidence between 0 and 1
    #[serde(rename = "Confidence")]
    pub confidence: Option<String>,
}

impl GatewayForm {
    /// The calling number, if the gateway sent a non-empty one.
    pub fn caller(&self) -> Option<&str> {
        self.from.as_deref().filter(|from| !from.trim().is_empty())
    }

    /// Captured input; speech wins when both are present.
    pub fn captured_input(&self) -> CapturedInput {
        match self.speech_result.as_deref().filter(|s| !s.is_empty()) {
            Some(transcript) => CapturedInput::Speech {
                transcript: transcript.to_string(),
                confidence: self.confidence.as_deref().and_then(|c| c.parse().ok()),
            },
            None => CapturedInput::Digits(self.digits.clone().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captured_digits() {
        let form = GatewayForm {
            from: Some("+48123456789".into()),
            digits: Some("1234".into()),
            ..Default::default()
        };
        assert_eq!(form.captured_input(), CapturedInput::Digits("1234".into()));
    }

    #[test]
    fn test_captured_speech_with_confidence() {
        let form = GatewayForm {
            from: Some("+48123456789".into()),
            speech_result: Some("123456".into()),
            confidence: Some("0.9".into()),
            ..Default::default()
        };
        assert_eq!(
            form.captured_input(),
            CapturedInput::Speech {
                transcript: "123456".into(),
                confidence: Some(0.9),
            }
        );
    }

    #[test]
    fn test_blank_caller_is_missing() {
        let form = GatewayForm {
            from: Some("  ".into()),
            ..Default::default()
        };
        assert!(form.caller().is_none());
    }
}

//! PIN extraction from keypad or speech capture.

use thiserror::Error;

/// Minimum number of digits in a PIN.
pub const MIN_PIN_DIGITS: usize = 4;

/// Maximum number of digits in a PIN.
pub const MAX_PIN_DIGITS: usize = 8;

/// Recognition confidence below which speech input is rejected.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.7;

/// Input captured from the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedInput {
    /// Keypad (DTMF) entry
    Digits(String),
    /// Transcribed speech with an optional recognizer confidence
    Speech {
        transcript: String,
        confidence: Option<f32>,
    },
}

impl CapturedInput {
    pub fn raw(&self) -> &str {
        match self {
            CapturedInput::Digits(digits) => digits,
            CapturedInput::Speech { transcript, .. } => transcript,
        }
    }

    pub fn confidence(&self) -> Option<f32> {
        match self {
            CapturedInput::Digits(_) => None,
            CapturedInput::Speech { confidence, .. } => *confidence,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            CapturedInput::Digits(_) => "dtmf",
            CapturedInput::Speech { .. } => "speech",
        }
    }
}

/// Reasons a capture is not a usable PIN.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PinError {
    #[error("No digits captured")]
    Empty,

    #[error("PIN must have between {min} and {max} digits, got {got}")]
    Length { got: usize, min: usize, max: usize },

    #[error("Recognition confidence {confidence} below threshold {threshold}")]
    LowConfidence { confidence: f32, threshold: f32 },
}

/// Strip every non-digit character and enforce the PIN length bounds.
pub fn normalize(raw: &str) -> Result<String, PinError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        0 => Err(PinError::Empty),
        n if !(MIN_PIN_DIGITS..=MAX_PIN_DIGITS).contains(&n) => Err(PinError::Length {
            got: n,
            min: MIN_PIN_DIGITS,
            max: MAX_PIN_DIGITS,
        }),
        _ => Ok(digits),
    }
}

/// Normalize a capture, rejecting low-confidence speech first.
///
/// A non-finite confidence counts as below the threshold.
pub fn normalize_capture(input: &CapturedInput, min_confidence: f32) -> Result<String, PinError> {
    if let Some(confidence) = input.confidence() {
        if !confidence.is_finite() || confidence < min_confidence {
            return Err(PinError::LowConfidence {
                confidence,
                threshold: min_confidence,
            });
        }
    }

    normalize(input.raw())
}

//! Instructions returned to the voice gateway.

use super::CaptureSettings;
use std::time::Duration;

/// PIN capture request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gather {
    /// Webhook receiving the captured input
    pub action: String,
    pub timeout: Duration,
    pub finish_on_key: String,
    /// Accepted input modes, e.g. "dtmf speech"
    pub input: String,
    pub speech_model: String,
    pub language: String,
}

/// A single gateway instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Say(String),
    Gather(Gather),
    Redirect(String),
    Hangup,
}

/// Ordered list of actions for the gateway to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub language: String,
    pub actions: Vec<Action>,
}

impl Directive {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            actions: Vec::new(),
        }
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.actions.push(Action::Say(text.into()));
        self
    }

    /// Ask for the PIN; fall through to the timeout handler when nothing is entered.
    pub fn challenge(mut self, capture: &CaptureSettings) -> Self {
        self.actions.push(Action::Gather(Gather {
            action: capture.verify_action.clone(),
            timeout: capture.timeout,
            finish_on_key: capture.finish_on_key.clone(),
            input: capture.input.clone(),
            speech_model: capture.speech_model.clone(),
            language: capture.language.clone(),
        }));
        self.actions.push(Action::Redirect(capture.timeout_action.clone()));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.actions.push(Action::Hangup);
        self
    }

    /// All spoken text, in order.
    pub fn spoken(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Say(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn gather(&self) -> Option<&Gather> {
        self.actions.iter().find_map(|a| match a {
            Action::Gather(g) => Some(g),
            _ => None,
        })
    }

    pub fn is_challenge(&self) -> bool {
        self.gather().is_some()
    }

    pub fn ends_call(&self) -> bool {
        matches!(self.actions.last(), Some(Action::Hangup))
    }
}

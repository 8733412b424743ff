//! Call flow state machine.
//!
//! Each gateway event is handled as a self-contained transaction against the
//! session registry: look the session up, decide, write back, and return a
//! [`Directive`] for the caller. The registry lock is never held while the
//! merchant is being called.

mod directive;
mod prompts;

pub use directive::{Action, Directive, Gather};
pub use prompts::Prompts;

use crate::pin::{normalize_capture, CapturedInput, DEFAULT_MIN_CONFIDENCE};
use crate::registry::{SessionId, SessionRegistry, VerificationSession};
use crate::verifier::{VerificationOutcome, Verifier};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Where a call ended up after handling one event.
///
/// The verifying phase has no variant: it lasts only while `code_captured`
/// awaits the merchant and is never observed outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// No pending session for the caller
    NoSession,
    /// Waiting for the caller to enter the PIN
    AwaitingCode,
    /// PIN accepted, session finalized
    Verified,
    /// Payment refused, session deleted
    Rejected,
    /// Caller did not enter a PIN in time
    TimedOut,
    /// Too many failed attempts, session deleted
    MaxRetriesExceeded,
}

impl CallState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CallState::AwaitingCode)
    }
}

/// Inbound call-lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    CallStarted { phone: String },
    CodeCaptured { phone: String, input: CapturedInput },
    CaptureTimeout { phone: String },
}

/// Result of handling one event.
#[derive(Debug, Clone)]
pub struct FlowStep {
    pub state: CallState,
    pub session_id: Option<SessionId>,
    pub directive: Directive,
}

/// PIN capture settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Time the caller has to start entering the PIN
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub finish_on_key: String,
    pub input: String,
    pub speech_model: String,
    pub language: String,
    /// Speech below this confidence is re-prompted
    pub min_confidence: f32,
    pub verify_action: String,
    pub timeout_action: String,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            finish_on_key: "#".into(),
            input: "dtmf speech".into(),
            speech_model: "phone_call".into(),
            language: "pl-PL".into(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            verify_action: "/verify".into(),
            timeout_action: "/timeout".into(),
        }
    }
}

/// Retry policy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowSettings {
    /// Failed verifications allowed per session; unbounded when unset
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

/// The call flow controller.
#[derive(Clone)]
pub struct CallFlow {
    registry: SessionRegistry,
    verifier: Arc<dyn Verifier>,
    capture: CaptureSettings,
    settings: FlowSettings,
    prompts: Prompts,
}

impl CallFlow {
    pub fn new(registry: SessionRegistry, verifier: Arc<dyn Verifier>) -> Self {
        Self {
            registry,
            verifier,
            capture: CaptureSettings::default(),
            settings: FlowSettings::default(),
            prompts: Prompts::default(),
        }
    }

    pub fn with_capture(mut self, capture: CaptureSettings) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_settings(mut self, settings: FlowSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    /// Dispatch a gateway event.
    pub async fn handle(&self, event: CallEvent) -> FlowStep {
        match event {
            CallEvent::CallStarted { phone } => self.call_started(&phone).await,
            CallEvent::CodeCaptured { phone, input } => self.code_captured(&phone, input).await,
            CallEvent::CaptureTimeout { phone } => self.capture_timeout(&phone).await,
        }
    }

    /// Greet the caller and ask for the PIN, or explain there is nothing to pay for.
    #[instrument(skip(self))]
    pub async fn call_started(&self, phone: &str) -> FlowStep {
        let Some(session) = self.pending_session(phone).await else {
            info!("Number rejected, no active transaction");
            return self.no_session();
        };

        info!(session_id = %session.id, "Call started, requesting PIN");
        self.step(
            CallState::AwaitingCode,
            Some(session.id),
            self.directive()
                .say(&self.prompts.welcome)
                .challenge(&self.capture),
        )
    }

    /// Validate the captured PIN and verify it with the merchant.
    #[instrument(skip(self, input), fields(source = input.source()))]
    pub async fn code_captured(&self, phone: &str, input: CapturedInput) -> FlowStep {
        let Some(session) = self.pending_session(phone).await else {
            info!("PIN captured but no active transaction");
            return self.no_session();
        };

        let code = match normalize_capture(&input, self.capture.min_confidence) {
            Ok(code) => code,
            Err(e) => {
                info!(session_id = %session.id, reason = %e, "Captured PIN rejected");
                return self.step(
                    CallState::AwaitingCode,
                    Some(session.id),
                    self.directive()
                        .say(&self.prompts.invalid_format)
                        .challenge(&self.capture),
                );
            }
        };

        info!(session_id = %session.id, "Verifying PIN with merchant");
        let outcome = self.verifier.verify(&session, &code).await;
        self.apply_outcome(&session, outcome).await
    }

    /// The caller entered nothing before the capture window closed.
    ///
    /// The session, if any, is left for the janitor.
    #[instrument(skip(self))]
    pub async fn capture_timeout(&self, phone: &str) -> FlowStep {
        let session_id = self.registry.find_by_phone(phone).await.map(|s| s.id);
        match session_id {
            Some(id) => info!(session_id = %id, "PIN capture timed out"),
            None => info!("PIN capture timed out without a session"),
        }

        self.step(
            CallState::TimedOut,
            session_id,
            self.directive().say(&self.prompts.timeout).hangup(),
        )
    }

    async fn apply_outcome(
        &self,
        session: &VerificationSession,
        outcome: VerificationOutcome,
    ) -> FlowStep {
        let id = session.id;

        match outcome {
            VerificationOutcome::Success => {
                if !self.registry.finalize_verified(&id).await {
                    warn!(session_id = %id, "Session already finalized by a concurrent request");
                    return self.no_session();
                }
                info!(session_id = %id, "Session is verified");
                self.step(
                    CallState::Verified,
                    Some(id),
                    self.directive().say(&self.prompts.success).hangup(),
                )
            }
            VerificationOutcome::PaymentError { code } => {
                self.registry.delete(&id).await;
                warn!(session_id = %id, %code, "Payment refused, session removed");
                self.step(
                    CallState::Rejected,
                    Some(id),
                    self.directive()
                        .say(self.prompts.payment_message(&code))
                        .hangup(),
                )
            }
            VerificationOutcome::InvalidPin => {
                info!(session_id = %id, "Merchant rejected PIN");
                self.retry(id, &self.prompts.invalid_pin).await
            }
            VerificationOutcome::InternalError => {
                warn!(session_id = %id, "Merchant internal error");
                self.retry(id, &self.prompts.internal_error).await
            }
            VerificationOutcome::Error(reason) => {
                error!(session_id = %id, %reason, "Error during verification");
                self.retry(id, &self.prompts.verification_error).await
            }
        }
    }

    /// Re-prompt after a retryable failure, enforcing the attempt limit if one is set.
    async fn retry(&self, id: SessionId, message: &str) -> FlowStep {
        if let Some(max_attempts) = self.settings.max_attempts {
            match self.registry.record_failed_attempt(&id).await {
                Ok(attempts) if attempts >= max_attempts => {
                    self.registry.delete(&id).await;
                    warn!(session_id = %id, attempts, "Attempt limit reached, session removed");
                    return self.step(
                        CallState::MaxRetriesExceeded,
                        Some(id),
                        self.directive()
                            .say(&self.prompts.attempts_exhausted)
                            .hangup(),
                    );
                }
                Ok(_) => {}
                Err(_) => {
                    info!(session_id = %id, "Session removed while verifying");
                    return self.no_session();
                }
            }
        }

        self.step(
            CallState::AwaitingCode,
            Some(id),
            self.directive().say(message).challenge(&self.capture),
        )
    }

    async fn pending_session(&self, phone: &str) -> Option<VerificationSession> {
        self.registry
            .find_by_phone(phone)
            .await
            .filter(VerificationSession::is_pending)
    }

    fn no_session(&self) -> FlowStep {
        self.step(
            CallState::NoSession,
            None,
            self.directive().say(&self.prompts.no_transaction).hangup(),
        )
    }

    fn directive(&self) -> Directive {
        Directive::new(&self.capture.language)
    }

    fn step(&self, state: CallState, session_id: Option<SessionId>, directive: Directive) -> FlowStep {
        FlowStep {
            state,
            session_id,
            directive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PHONE: &str = "+48123456789";

    /// Returns a fixed outcome and counts calls.
    struct FixedVerifier {
        outcome: VerificationOutcome,
        calls: AtomicUsize,
    }

    impl FixedVerifier {
        fn new(outcome: VerificationOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Verifier for FixedVerifier {
        async fn verify(&self, _session: &VerificationSession, _code: &str) -> VerificationOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    async fn flow_with(outcome: VerificationOutcome) -> (CallFlow, Arc<FixedVerifier>, SessionId) {
        let registry = SessionRegistry::new();
        let id = registry
            .create(PHONE, "https://merchant.example.com/verify", "secret")
            .await
            .unwrap();
        let verifier = FixedVerifier::new(outcome);
        (CallFlow::new(registry, verifier.clone()), verifier, id)
    }

    fn keypad(digits: &str) -> CapturedInput {
        CapturedInput::Digits(digits.into())
    }

    #[tokio::test]
    async fn test_call_started_without_session() {
        let (flow, _, _) = flow_with(VerificationOutcome::Success).await;
        let step = flow.call_started("+48000000000").await;

        assert_eq!(step.state, CallState::NoSession);
        assert_eq!(step.directive.spoken(), vec![flow.prompts().no_transaction.as_str()]);
        assert!(step.directive.ends_call());
    }

    #[tokio::test]
    async fn test_call_started_challenges_caller() {
        let (flow, _, id) = flow_with(VerificationOutcome::Success).await;
        let step = flow.call_started(PHONE).await;

        assert_eq!(step.state, CallState::AwaitingCode);
        assert_eq!(step.session_id, Some(id));
        assert!(step.directive.is_challenge());
    }

    #[tokio::test]
    async fn test_invalid_capture_skips_verifier() {
        let (flow, verifier, _) = flow_with(VerificationOutcome::Success).await;
        let step = flow.code_captured(PHONE, keypad("abc")).await;

        assert_eq!(step.state, CallState::AwaitingCode);
        assert!(step.directive.is_challenge());
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_low_confidence_speech_reprompts() {
        let (flow, verifier, _) = flow_with(VerificationOutcome::Success).await;
        let input = CapturedInput::Speech {
            transcript: "1234".into(),
            confidence: Some(0.4),
        };
        let step = flow.code_captured(PHONE, input).await;

        assert_eq!(step.state, CallState::AwaitingCode);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retryable_outcomes_keep_session() {
        for outcome in [
            VerificationOutcome::InvalidPin,
            VerificationOutcome::InternalError,
            VerificationOutcome::Error("connection refused".into()),
        ] {
            let (flow, _, id) = flow_with(outcome).await;
            let step = flow.code_captured(PHONE, keypad("1234")).await;

            assert_eq!(step.state, CallState::AwaitingCode);
            assert!(step.directive.is_challenge());
            assert!(flow.registry().get(&id).await.unwrap().is_pending());
        }
    }

    #[tokio::test]
    async fn test_attempt_limit() {
        let (flow, _, id) = flow_with(VerificationOutcome::InvalidPin).await;
        let flow = flow.with_settings(FlowSettings {
            max_attempts: Some(2),
        });

        let first = flow.code_captured(PHONE, keypad("1111")).await;
        assert_eq!(first.state, CallState::AwaitingCode);

        let second = flow.code_captured(PHONE, keypad("2222")).await;
        assert_eq!(second.state, CallState::MaxRetriesExceeded);
        assert!(second.directive.ends_call());
        assert!(flow.registry().get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_capture_timeout_leaves_session() {
        let (flow, _, id) = flow_with(VerificationOutcome::Success).await;
        let step = flow.capture_timeout(PHONE).await;

        assert_eq!(step.state, CallState::TimedOut);
        assert_eq!(step.session_id, Some(id));
        assert!(flow.registry().get(&id).await.unwrap().is_pending());
    }

    #[tokio::test]
    async fn test_handle_dispatches_events() {
        let (flow, _, _) = flow_with(VerificationOutcome::Success).await;

        let step = flow
            .handle(CallEvent::CallStarted {
                phone: PHONE.into(),
            })
            .await;
        assert_eq!(step.state, CallState::AwaitingCode);

        let step = flow
            .handle(CallEvent::CodeCaptured {
                phone: PHONE.into(),
                input: keypad("1234"),
            })
            .await;
        assert_eq!(step.state, CallState::Verified);
        assert!(step.state.is_terminal());
    }
}

//! Voice PIN Gateway - phone call PIN verification service.
//!
//! Merchants open a session for a phone number. When that number calls in,
//! the gateway asks for the PIN from the SMS, forwards it to the merchant's
//! verification endpoint and tells the caller how it went.

pub mod api;
pub mod config;
pub mod error;
pub mod flow;
pub mod janitor;
pub mod pin;
pub mod registry;
pub mod twiml;
pub mod verifier;

pub use config::Config;
pub use error::{GatewayError, RegistryError};
pub use flow::{CallEvent, CallFlow, CallState, Directive, FlowStep};
pub use registry::{SessionRegistry, SessionStatus, VerificationSession};
pub use verifier::{MerchantClient, VerificationOutcome, Verifier};

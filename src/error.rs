//! Setup errors and captured producer faults.
//!
//! Two failure shapes, kept apart on purpose:
//!
//! - [`SetupError`] - programmer-contract violations caught while wiring a
//!   promise; surfaced as ordinary `Result`s and never routed through
//!   catch/finally.
//! - [`Fault`] - a panic captured at the recovery boundary; handed by
//!   reference to the promise's catch hook and never propagated further.
//!
//! Rejection is neither: a rejected promise is ordinary control flow
//! through the rejected chain.

use std::any::Any;
use std::fmt;
use thiserror::Error;

/// Contract violations reported while wiring a promise.
#[derive(Error, Debug)]
pub enum SetupError {
    /// Registration or hook replacement was attempted after execution
    /// started; chains and hooks are frozen from that point.
    #[error("promise already started: handler chains and hooks are frozen")]
    Started,

    /// `race` was invoked with no contender promises.
    #[error("race needs at least one contender promise")]
    NoContenders,
}

/// A captured producer panic, handed to the catch hook.
///
/// The recovery boundary extracts a human-readable message from `&str` and
/// `String` panic payloads; anything else gets a fallback description.
#[derive(Debug, Clone)]
pub struct Fault {
    message: String,
}

impl Fault {
    pub(crate) fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self { message }
    }

    /// Human-readable description of the panic.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "producer fault: {}", self.message)
    }
}

impl std::error::Error for Fault {}

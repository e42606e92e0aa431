//! Actuator error types

use thiserror::Error;

/// Errors raised while commanding an on/off actuator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuatorError {
    #[error("Command {} -> {actuator} failed: {message}", on_off(.on))]
    CommandFailed {
        actuator: String,
        on: bool,
        message: String,
    },

    #[error("Command {} -> {actuator} not acknowledged after {duration_ms}ms", on_off(.on))]
    Timeout {
        actuator: String,
        on: bool,
        duration_ms: u64,
    },

    #[error("Actuator unavailable: {0}")]
    Unavailable(String),
}

fn on_off(on: &bool) -> &'static str {
    if *on {
        "on"
    } else {
        "off"
    }
}

impl ActuatorError {
    /// Create a command failure with actuator context
    pub fn command_failed(actuator: impl Into<String>, on: bool, message: impl Into<String>) -> Self {
        ActuatorError::CommandFailed {
            actuator: actuator.into(),
            on,
            message: message.into(),
        }
    }

    /// Create a timeout error with actuator context
    pub fn timeout(actuator: impl Into<String>, on: bool, duration_ms: u64) -> Self {
        ActuatorError::Timeout {
            actuator: actuator.into(),
            on,
            duration_ms,
        }
    }

    /// Actuator the failed command was addressed to
    pub fn actuator(&self) -> &str {
        match self {
            ActuatorError::CommandFailed { actuator, .. } => actuator,
            ActuatorError::Timeout { actuator, .. } => actuator,
            ActuatorError::Unavailable(actuator) => actuator,
        }
    }

    /// Check if a caller could reasonably try the command again.
    ///
    /// Nothing in this workspace retries automatically; the flag is for hosts
    /// that want to.
    pub fn is_retryable(&self) -> bool {
        match self {
            ActuatorError::Timeout { .. } => true,
            ActuatorError::CommandFailed { .. } => false,
            ActuatorError::Unavailable(_) => false,
        }
    }
}

pub type ActuatorResult<T> = Result<T, ActuatorError>;

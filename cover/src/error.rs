//! Cover error types

use tilted_cover_actuator::ActuatorError;
use thiserror::Error;

/// Errors surfaced by cover configuration and control
#[derive(Debug, Error)]
pub enum CoverError {
    /// Energizing (or a requested de-energize of) a relay failed
    #[error("Actuator command failed: {0}")]
    ActuatorCommandFailed(#[from] ActuatorError),

    /// A run was preempted by a newer request or by stop.
    ///
    /// [`RunOutcome::into_result`](crate::RunOutcome::into_result) yields it;
    /// controller operations treat it as success and never return it.
    #[error("Movement cancelled")]
    MovementCancelled,

    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),

    #[error("Malformed configuration entry: {0}")]
    Config(#[from] serde_json::Error),
}

impl CoverError {
    pub fn invalid(message: impl Into<String>) -> Self {
        CoverError::ConfigurationInvalid(message.into())
    }
}

pub type CoverResult<T> = Result<T, CoverError>;

//! Error types for Gatekeeper

use std::time::{Duration, Instant};
use thiserror::Error;

/// Result type alias for gate construction and configuration
pub type GateResult<T> = Result<T, GateError>;

/// Errors raised while building gates or loading their configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration file could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl GateError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<std::io::Error> for GateError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for GateError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(format!("JSON: {}", error))
    }
}

impl From<serde_yaml::Error> for GateError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Parse(format!("YAML: {}", error))
    }
}

impl From<toml::de::Error> for GateError {
    fn from(error: toml::de::Error) -> Self {
        Self::Parse(format!("TOML: {}", error))
    }
}

/// A call was rejected because the gate is open.
///
/// The operation was never invoked. `next_attempt_at` is the earliest instant
/// at which the gate will admit a probe; `retry_after` is the same deadline
/// relative to the moment of rejection, suitable for a `Retry-After` header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Gate '{gate}' is open, next attempt allowed in {retry_after:?}")]
pub struct GateOpenError {
    /// Name of the gate that rejected the call
    pub gate: String,
    /// When the gate tripped
    pub opened_at: Instant,
    /// Earliest instant a probe will be admitted
    pub next_attempt_at: Instant,
    /// Time remaining until `next_attempt_at`, measured at rejection
    pub retry_after: Duration,
}

/// Outcome of a failed `execute` call
#[derive(Error, Debug)]
pub enum CallError<E> {
    /// The gate rejected the call without running the operation
    #[error(transparent)]
    Rejected(#[from] GateOpenError),

    /// The operation ran and failed; the error is returned untouched
    #[error("{0}")]
    Operation(E),
}

impl<E> CallError<E> {
    /// Whether the call was rejected by the gate
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// The rejection, if the gate refused the call
    pub fn as_rejection(&self) -> Option<&GateOpenError> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            Self::Operation(_) => None,
        }
    }

    /// Take back the operation's own error, if the operation ran
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Self::Rejected(_) => None,
            Self::Operation(error) => Some(error),
        }
    }
}

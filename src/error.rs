// Error types - what can go wrong during a chat turn

use thiserror::Error;

/// Result type for orchestrator operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that end a turn (or the process at startup)
#[derive(Error, Debug)]
pub enum AgentError {
    /// Malformed tool declaration or missing/invalid settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The model reply is neither plain text nor a well-formed function call
    #[error("Unrecognized model reply: {0}")]
    InterpreterAmbiguity(String),

    /// Transport failure talking to the hosted model
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Hosted model answered with a non-success status
    #[error("API request failed ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Raised by the action executor when the external call gives no usable result.
///
/// The orchestrator never propagates this; it substitutes a fixed reply instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionFailure {
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("invalid arguments for '{function}': {reason}")]
    InvalidArguments { function: String, reason: String },

    #[error("flight service returned no usable result")]
    NoResult,

    #[error("flight service unreachable: {0}")]
    Unreachable(String),
}

//! Error types for the Azure backend.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the Azure Resource Manager backend.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AzureBackendError {
    /// Raised when the account configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when a token cannot be obtained or the API rejects it.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Description returned by the authority or the API.
        message: String,
    },
    /// Raised when the API answers with a non-success status.
    #[error("Azure API returned {status} ({code}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// ARM error code, or empty when the body carried none.
        code: String,
        /// ARM error message or raw body.
        message: String,
    },
    /// Raised when a long-running operation ends in failure or cancellation.
    #[error("operation on {target} ended with status {status}: {message}")]
    OperationFailed {
        /// Resource the operation acted on.
        target: String,
        /// Terminal status reported by the API.
        status: String,
        /// Error message reported by the API, if any.
        message: String,
    },
    /// Raised when a long-running operation exceeds the timeout.
    #[error("timeout waiting for {operation} on {target}")]
    Timeout {
        /// What was being waited on.
        operation: String,
        /// Resource the operation acted on.
        target: String,
    },
    /// Raised when the request could not be sent or the response not read.
    #[error("transport error: {message}")]
    Transport {
        /// Message from the HTTP client.
        message: String,
    },
    /// Raised when a response body does not have the expected shape.
    #[error("unexpected response body: {message}")]
    Decode {
        /// Message from the JSON decoder.
        message: String,
    },
}

impl From<ConfigError> for AzureBackendError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<reqwest::Error> for AzureBackendError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport {
            message: value.to_string(),
        }
    }
}

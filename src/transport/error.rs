//! Transport error types
//!
//! `AttemptFailure` describes why a single attempt failed; every variant is
//! retryable. `TransportError` is what callers see once the retry budget is
//! spent (or when the transport could not be built at all).

use thiserror::Error;

/// Failure of one HTTP attempt
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttemptFailure {
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl AttemptFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptFailure::Timeout(_) => "timeout",
            AttemptFailure::Network(_) => "network",
            AttemptFailure::Status { .. } => "status",
            AttemptFailure::Decode(_) => "decode",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// All attempts failed; carries the last cause only
    #[error("unable to reach server after {attempts} attempt(s): {cause}")]
    Exhausted {
        method: String,
        url: String,
        attempts: u32,
        cause: AttemptFailure,
    },

    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl TransportError {
    /// Last underlying cause, if any request was attempted
    pub fn cause(&self) -> Option<&AttemptFailure> {
        match self {
            TransportError::Exhausted { cause, .. } => Some(cause),
            TransportError::InvalidBaseUrl { .. } => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            TransportError::Exhausted { attempts, .. } => *attempts,
            TransportError::InvalidBaseUrl { .. } => 0,
        }
    }
}

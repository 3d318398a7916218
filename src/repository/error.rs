//! Repository Error Types
//!
//! Every operation reports failures through its own `RepositoryError`
//! variant wrapping a `FailureCause`, so callers can both tell which
//! operation failed and why.

use thiserror::Error;

use crate::transport::TransportError;

/// Why an operation failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FailureCause {
    /// Retries exhausted (network, timeout, non-2xx, unparseable body)
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Well-formed reply whose `status` is not "success"
    #[error("{0}")]
    Application(String),

    /// Caller supplied an empty identifier; nothing was sent
    #[error("{0}")]
    Validation(String),

    /// Reply parsed as JSON but not into the expected shape
    #[error("malformed payload: {0}")]
    Decode(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("Failed to load users: {0}")]
    UserFetch(FailureCause),

    #[error("Failed to load ads: {0}")]
    AdFetch(FailureCause),

    #[error("Failed to get recommendations: {0}")]
    RecommendationFetch(FailureCause),

    #[error("Failed to get user profile: {0}")]
    ProfileFetch(FailureCause),

    #[error("Failed to record interaction: {0}")]
    Interaction(FailureCause),

    #[error("Health probe failed: {0}")]
    HealthProbe(FailureCause),
}

impl RepositoryError {
    pub fn cause(&self) -> &FailureCause {
        match self {
            RepositoryError::UserFetch(c)
            | RepositoryError::AdFetch(c)
            | RepositoryError::RecommendationFetch(c)
            | RepositoryError::ProfileFetch(c)
            | RepositoryError::Interaction(c)
            | RepositoryError::HealthProbe(c) => c,
        }
    }

    /// Stable code for logs and notices
    pub fn code(&self) -> &'static str {
        match self {
            RepositoryError::UserFetch(_) => "USER_FETCH_FAILED",
            RepositoryError::AdFetch(_) => "AD_FETCH_FAILED",
            RepositoryError::RecommendationFetch(_) => "RECOMMENDATION_FETCH_FAILED",
            RepositoryError::ProfileFetch(_) => "PROFILE_FETCH_FAILED",
            RepositoryError::Interaction(_) => "INTERACTION_FAILED",
            RepositoryError::HealthProbe(_) => "HEALTH_PROBE_FAILED",
        }
    }

    /// Only transport failures would have benefited from another try
    pub fn is_retryable(&self) -> bool {
        matches!(self.cause(), FailureCause::Transport(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.cause(), FailureCause::Validation(_))
    }
}

//! Reasoner error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during reasoner calls
///
/// Every variant is raised, never folded into a low-confidence result:
/// a transport failure must not masquerade as a gate failure.
#[derive(Debug, Error)]
pub enum ReasonerError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Result did not match the requested schema: {0}")]
    SchemaMismatch(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReasonerError {
    /// Check if this error is retryable by an outer surface
    ///
    /// The pipeline itself never retries; this informs the request surface.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReasonerError::RateLimited { .. } => true,
            ReasonerError::ApiError { status, .. } => *status >= 500,
            ReasonerError::Network(_) => true,
            ReasonerError::Timeout(_) => true,
            ReasonerError::SchemaMismatch(_) => false,
            ReasonerError::Json(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(
            ReasonerError::RateLimited {
                retry_after: Duration::from_secs(60)
            }
            .is_retryable()
        );

        assert!(
            ReasonerError::ApiError {
                status: 503,
                message: "Service unavailable".to_string()
            }
            .is_retryable()
        );

        assert!(
            !ReasonerError::ApiError {
                status: 400,
                message: "Bad request".to_string()
            }
            .is_retryable()
        );

        assert!(ReasonerError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(!ReasonerError::SchemaMismatch("missing field".to_string()).is_retryable());
    }
}

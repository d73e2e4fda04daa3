//! Error types shared across the fetch pipeline and its callers.

use thiserror::Error;

/// Errors produced by the upstream fetch pipeline.
///
/// Every stage of the pipeline (validation, breaker, HTTP, parse, fallback)
/// maps into one of these variants, so call sites can decide between
/// retrying, degrading and surfacing without string matching.
///
/// The enum is `Clone` because fresh error entries in the cache are
/// re-surfaced to later callers without re-running the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Request validation failed before any network activity.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Upstream rejected the request with 401 (geo/IP restrictions).
    #[error("BCRA API unauthorized access (401)")]
    Unauthorized,

    /// Upstream returned 404 for the requested resource.
    #[error("BCRA API resource not found")]
    NotFound,

    /// Body could not be decoded into the expected payload.
    #[error("failed to parse upstream payload: {0}")]
    Parse(String),

    /// Transport failure: connect error, timeout, broken stream or an
    /// unexpected HTTP status.
    #[error("upstream request failed: {0}")]
    Network(String),

    /// Circuit breaker is open; the call was refused without touching the
    /// network.
    #[error("circuit breaker is open - too many recent failures")]
    CircuitOpen,

    /// The external fallback store is not configured or unreachable.
    #[error("fallback cache unavailable: {0}")]
    FallbackUnavailable(String),
}

impl FetchError {
    /// Whether the bounded retry loop should attempt the call again.
    ///
    /// Only transport and parse failures are retried. 401 is surfaced
    /// immediately (retrying cannot fix a geo block), 404 is a stable
    /// answer, and a tripped breaker must not be hammered.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::Parse(_))
    }

    /// Whether the error counts against the circuit breaker.
    pub fn is_breaker_failure(&self) -> bool {
        matches!(
            self,
            FetchError::Unauthorized | FetchError::Network(_) | FetchError::Parse(_)
        )
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Network("BCRA API request timed out".to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e.to_string())
    }
}

impl From<redis::RedisError> for FetchError {
    fn from(e: redis::RedisError) -> Self {
        FetchError::FallbackUnavailable(e.to_string())
    }
}

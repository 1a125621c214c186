//! Error types for source queries, with retryability classification.

use thiserror::Error;

/// Errors raised while querying balance sources.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP status {0}: {1}")]
    HttpStatus(u16, String),

    #[error("rate limited by source")]
    RateLimited,

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid process id: {0}")]
    InvalidProcessId(String),

    #[error("invalid message id: {0}")]
    InvalidMessageId(String),

    #[error("baseline contains no addresses")]
    EmptyBaseline,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Whether a failed attempt may be retried.
    ///
    /// Timeouts, connection failures, rate limiting, and 5xx statuses are
    /// transient. Non-429 4xx statuses and malformed responses are
    /// terminal since retrying the same request cannot change them.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Timeout
            | SourceError::ConnectionFailed(_)
            | SourceError::RateLimited => true,
            SourceError::HttpStatus(status, _) => *status >= 500 || *status == 429,
            SourceError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Inverse of [`is_retryable`](Self::is_retryable), kept for call
    /// sites that read better in the positive.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        !self.is_retryable()
    }

    /// Maps a transport-level `reqwest` failure onto the closest variant.
    #[must_use]
    pub fn from_network(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_connect() {
            SourceError::ConnectionFailed("connection refused or unreachable".to_string())
        } else {
            SourceError::Network(err)
        }
    }
}

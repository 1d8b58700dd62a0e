//! Error types for the search subsystem

use thiserror::Error;

/// Result type alias for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Result type alias for content-store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by the content store backing a search engine.
///
/// The search core never swallows or rewraps these: they propagate to the
/// caller unchanged inside [`SearchError::Store`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested team does not exist
    #[error("Team not found: {0}")]
    TeamNotFound(String),

    /// The requested channel does not exist
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    /// The requested user does not exist
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The requested post does not exist
    #[error("Post not found: {0}")]
    PostNotFound(String),

    /// Underlying storage failure (connection lost, corrupted page, etc.)
    #[error("Store backend failure: {0}")]
    Backend(String),
}

/// Errors that can occur during query parsing and execution.
///
/// Scope denial is deliberately *not* an error: a user whose view
/// restrictions leave nothing visible gets an empty result set.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed query syntax (unbalanced quote, bad modifier value).
    /// Always local and non-retryable.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// An external engine backend is unreachable. Surfaced as-is, never
    /// silently downgraded to a different engine's results.
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The caller-supplied deadline elapsed mid-query
    #[error("Search timeout: {0}")]
    Timeout(String),

    /// The caller cancelled the query
    #[error("Search cancelled: {0}")]
    Cancelled(String),

    /// Store-layer failure, propagated unchanged
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SearchError {
    /// Returns the error type string (for structured logging and responses)
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::EngineUnavailable(_) => "ENGINE_UNAVAILABLE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Cancelled(_) => "CANCELLED",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns whether the error is transient and can be retried.
    ///
    /// Only timeouts are retryable; cancellation was requested by the caller
    /// and an unavailable engine needs operator attention, not a retry loop.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

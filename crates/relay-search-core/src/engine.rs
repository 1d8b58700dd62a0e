//! The engine contract every search backend satisfies.
//!
//! Engines are interchangeable: the conformance suite runs the same case
//! tables against each implementation and requires identical logical
//! results. Engines are stateless with respect to requests; the store is
//! passed per call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{SearchError, SearchResult};
use crate::model::Channel;
use crate::query::{SearchParams, UserSearchOptions, ViewRestrictions};
use crate::results::{PostSearchResults, UserAutocomplete};
use crate::store::ContentStore;

/// Cooperative cancellation handle for a running search.
///
/// Cloned tokens share the cancel flag. Engines call [`CancelToken::check`]
/// between per-channel batches and abort with a distinct error kind rather
/// than returning silently truncated results.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
}

impl CancelToken {
    /// A token that never times out
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that times out after `timeout`
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
            timeout: Some(timeout),
        }
    }

    /// Request cancellation; observed by all clones of this token
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Abort the search if cancelled or past the deadline.
    ///
    /// Cancellation takes precedence over the deadline when both hold; the
    /// caller asked first.
    pub fn check(&self) -> SearchResult<()> {
        if self.is_cancelled() {
            return Err(SearchError::Cancelled("cancelled by caller".to_owned()));
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                let timeout = self.timeout.unwrap_or_default();
                return Err(SearchError::Timeout(format!(
                    "deadline of {timeout:?} elapsed"
                )));
            }
        }
        Ok(())
    }
}

/// One post-search invocation
#[derive(Debug, Clone, Copy)]
pub struct PostSearchRequest<'a> {
    /// Parameter clauses; multiple clauses combine with AND
    pub params: &'a [SearchParams],
    /// The searching user (scopes results to their memberships)
    pub user_id: &'a str,
    /// The team the search runs in
    pub team_id: &'a str,
    /// Optional view-restriction overrides
    pub restrictions: Option<&'a ViewRestrictions>,
    /// Zero-based page index
    pub page: usize,
    /// Page size
    pub per_page: usize,
}

/// A pluggable search backend.
///
/// Every implementation must produce identical logical results for the same
/// store contents and request: same matched ids, same ranked order, same
/// fragments (as unordered sets), same partitioning.
pub trait SearchEngine: Send + Sync {
    /// Stable engine name for logging and diagnostics
    fn name(&self) -> &'static str;

    /// Ranked, scoped, paginated post search
    fn search_posts(
        &self,
        store: &dyn ContentStore,
        request: &PostSearchRequest<'_>,
        cancel: &CancelToken,
    ) -> SearchResult<PostSearchResults>;

    /// Autocomplete users for an @-mention box in a channel
    fn autocomplete_users_in_channel(
        &self,
        store: &dyn ContentStore,
        team_id: &str,
        channel_id: &str,
        term: &str,
        options: &UserSearchOptions,
    ) -> SearchResult<UserAutocomplete>;

    /// Autocomplete channels a user may view in a team
    fn autocomplete_channels(
        &self,
        store: &dyn ContentStore,
        user_id: &str,
        team_id: &str,
        term: &str,
        include_deleted: bool,
    ) -> SearchResult<Vec<Channel>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_passes_check() {
        let token = CancelToken::new();
        assert!(token.check().is_ok());
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancelled_token_reports_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let err = token.check().unwrap_err();
        assert_eq!(err.error_type(), "CANCELLED");
        assert!(!err.is_retryable());
    }

    #[test]
    fn clones_share_the_cancel_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn elapsed_deadline_reports_timeout() {
        let token = CancelToken::with_timeout(Duration::ZERO);
        let err = token.check().unwrap_err();
        assert_eq!(err.error_type(), "TIMEOUT");
        assert!(err.is_retryable());
    }

    #[test]
    fn cancellation_takes_precedence_over_timeout() {
        let token = CancelToken::with_timeout(Duration::ZERO);
        token.cancel();
        let err = token.check().unwrap_err();
        assert_eq!(err.error_type(), "CANCELLED");
    }
}

//! The default engine: boundary-aligned matching evaluated per candidate
//! post, the way a relational backend would run `LIKE`-shaped predicates
//! over every row in scope.

use tracing::debug;

use crate::engine::{CancelToken, PostSearchRequest, SearchEngine};
use crate::error::SearchResult;
use crate::executor;
use crate::model::Channel;
use crate::query::UserSearchOptions;
use crate::results::{PostSearchResults, UserAutocomplete};
use crate::store::ContentStore;

/// Per-post scan engine; always available
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationalEngine;

impl RelationalEngine {
    /// Create the engine
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SearchEngine for RelationalEngine {
    fn name(&self) -> &'static str {
        "relational"
    }

    fn search_posts(
        &self,
        store: &dyn ContentStore,
        request: &PostSearchRequest<'_>,
        cancel: &CancelToken,
    ) -> SearchResult<PostSearchResults> {
        debug!(engine = self.name(), "running post search");
        // every candidate goes straight to evaluation
        executor::run_post_search(store, request, cancel, |texts, _| (0..texts.len()).collect())
    }

    fn autocomplete_users_in_channel(
        &self,
        store: &dyn ContentStore,
        team_id: &str,
        channel_id: &str,
        term: &str,
        options: &UserSearchOptions,
    ) -> SearchResult<UserAutocomplete> {
        executor::autocomplete_users_in_channel(store, team_id, channel_id, term, options)
    }

    fn autocomplete_channels(
        &self,
        store: &dyn ContentStore,
        user_id: &str,
        team_id: &str,
        term: &str,
        include_deleted: bool,
    ) -> SearchResult<Vec<Channel>> {
        executor::autocomplete_channels(store, user_id, team_id, term, include_deleted)
    }
}

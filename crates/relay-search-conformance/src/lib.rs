//! # relay-search-conformance
//!
//! Conformance harness for Relay search engines. Every case in `tests/`
//! runs through [`for_each_engine`], which executes the closure once per
//! engine implementation; an engine passes the suite only if it produces
//! the same logical results as every other engine for every case.

mod fixture;
mod memstore;

pub use fixture::SearchFixture;
pub use memstore::MemStore;

use relay_search_core::{
    CancelToken, InvertedEngine, PostSearchRequest, PostSearchResults, RelationalEngine,
    SearchEngine, SearchResult,
};

/// Run a closure against every engine implementation.
///
/// Each invocation gets the engine's name for failure messages; build a
/// fresh [`SearchFixture`] inside the closure so cases stay independent.
pub fn for_each_engine(mut case: impl FnMut(&dyn SearchEngine)) {
    let relational = RelationalEngine::new();
    tracing::debug!(engine = relational.name(), "running conformance case");
    case(&relational);

    let inverted = InvertedEngine::new();
    tracing::debug!(engine = inverted.name(), "running conformance case");
    case(&inverted);
}

/// First-page search with a generous page size and no restrictions
pub fn run_search(
    engine: &dyn SearchEngine,
    fixture: &SearchFixture,
    raw_query: &str,
) -> SearchResult<PostSearchResults> {
    let params = relay_search_core::parse_search_params(raw_query)?;
    let request = PostSearchRequest {
        params: &params,
        user_id: &fixture.user.id,
        team_id: &fixture.team.id,
        restrictions: None,
        page: 0,
        per_page: 60,
    };
    engine.search_posts(&fixture.store, &request, &CancelToken::new())
}

/// Ranked ids of a result page
#[must_use]
pub fn result_ids(results: &PostSearchResults) -> Vec<String> {
    results.order()
}

/// Ids sorted for unordered comparison
#[must_use]
pub fn sorted_ids(results: &PostSearchResults) -> Vec<String> {
    let mut ids = results.order();
    ids.sort_unstable();
    ids
}

//! # relay-search-core
//!
//! Search query semantics for the Relay message platform: a tokenizer and
//! normalizer tuned for multi-script chat content, a query parser for the
//! `from:`/`in:`/`after:` modifier grammar, membership- and restriction-aware
//! access scoping, and ranked execution with per-post match reporting.
//!
//! The same logical contract is implemented by interchangeable engines
//! behind [`SearchEngine`]; the `relay-search-conformance` crate runs a
//! shared case suite against every implementation to keep them honest.
//!
//! ## Quick tour
//!
//! ```
//! use relay_search_core::{parse_search_params, RelationalEngine};
//!
//! let params = parse_search_params("\"launch plan\" budget from:@ana").unwrap();
//! assert_eq!(params.len(), 1);
//! assert_eq!(params[0].from_users, vec!["ana".to_owned()]);
//! let _engine = RelationalEngine::new();
//! ```

pub mod engine;
pub mod engines;
pub mod error;
mod executor;
pub mod highlight;
pub mod model;
pub mod query;
pub mod results;
pub mod scope;
pub mod store;
pub mod text;

#[cfg(test)]
mod teststore;

pub use engine::{CancelToken, PostSearchRequest, SearchEngine};
pub use engines::{InvertedEngine, RelationalEngine};
pub use error::{SearchError, SearchResult, StoreError, StoreResult};
pub use highlight::build_matches;
pub use model::{Channel, ChannelId, ChannelKind, Post, PostId, Team, TeamId, User, UserId};
pub use query::{
    compile_terms, parse_search_params, PhraseSpec, SearchParams, TermExpr, TermSpec,
    UserSearchOptions, ViewRestrictions,
};
pub use results::{PostSearchMatches, PostSearchResults, UserAutocomplete};
pub use scope::{scope_channels, scope_users, ChannelScope, UserScope};
pub use store::ContentStore;
pub use text::{
    normalize, normalize_phrase, strip_markdown, term_matches_token, term_prefix_matches_token,
    tokenize, ScriptClass, SearchableText, Token,
};

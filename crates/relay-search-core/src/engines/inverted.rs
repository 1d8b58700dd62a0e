//! External-engine stand-in: candidate selection through a request-scoped
//! inverted index instead of a per-post scan.
//!
//! The index maps each token's normalized form to the set of posts carrying
//! it. Terms select candidates by scanning the dictionary with the same
//! boundary/prefix predicates the evaluator uses; phrase words select by
//! plain substring containment, a deliberate over-approximation (the
//! evaluator re-verifies every candidate, so selection only has to be a
//! superset of the true matches).
//!
//! The availability toggle models an external backend going offline: an
//! unavailable engine reports [`crate::error::SearchError::EngineUnavailable`]
//! instead of silently falling back to different results.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::engine::{CancelToken, PostSearchRequest, SearchEngine};
use crate::error::{SearchError, SearchResult};
use crate::executor::{self, CompiledClause, CompiledQuery};
use crate::model::Channel;
use crate::query::UserSearchOptions;
use crate::results::{PostSearchResults, UserAutocomplete};
use crate::store::ContentStore;
use crate::text::{term_matches_token, term_prefix_matches_token, SearchableText};

/// Posting-list engine with an availability toggle
#[derive(Debug, Default)]
pub struct InvertedEngine {
    unavailable: AtomicBool,
}

impl InvertedEngine {
    /// Create the engine in the available state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle availability; an unavailable engine fails every search
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::Relaxed);
    }

    fn ensure_available(&self) -> SearchResult<()> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(SearchError::EngineUnavailable(
                "inverted engine is offline".to_owned(),
            ));
        }
        Ok(())
    }
}

type Postings<'a> = BTreeMap<&'a str, BTreeSet<usize>>;

fn build_postings(texts: &[SearchableText]) -> Postings<'_> {
    let mut postings = Postings::new();
    for (doc, text) in texts.iter().enumerate() {
        for token in text.tokens() {
            postings
                .entry(token.normalized.as_str())
                .or_default()
                .insert(doc);
        }
    }
    postings
}

fn all_docs(count: usize) -> BTreeSet<usize> {
    (0..count).collect()
}

/// Docs containing a token the term predicate accepts
fn term_docs(postings: &Postings<'_>, term: &str, prefix: bool) -> BTreeSet<usize> {
    let mut docs = BTreeSet::new();
    for (entry, posting) in postings {
        let hit = if prefix {
            term_prefix_matches_token(term, entry)
        } else {
            term_matches_token(term, entry)
        };
        if hit {
            docs.extend(posting);
        }
    }
    docs
}

/// Superset of docs that could contain a phrase word: any token whose
/// normalized form contains the word. Verification tightens this.
fn phrase_word_docs(postings: &Postings<'_>, word: &str) -> BTreeSet<usize> {
    let mut docs = BTreeSet::new();
    for (entry, posting) in postings {
        if entry.contains(word) {
            docs.extend(posting);
        }
    }
    docs
}

fn intersect(acc: Option<BTreeSet<usize>>, next: BTreeSet<usize>) -> Option<BTreeSet<usize>> {
    Some(match acc {
        None => next,
        Some(prev) => prev.intersection(&next).copied().collect(),
    })
}

fn clause_candidates(
    clause: &CompiledClause,
    postings: &Postings<'_>,
    doc_count: usize,
) -> BTreeSet<usize> {
    let expr = &clause.include;
    if expr.is_empty() {
        // filters-only clause: the index cannot narrow anything
        return all_docs(doc_count);
    }

    let mut candidates: Option<BTreeSet<usize>> = None;

    for phrase in &expr.phrases {
        for word in phrase.normalized.split_whitespace() {
            candidates = intersect(candidates, phrase_word_docs(postings, word));
        }
    }

    if !expr.terms.is_empty() {
        let per_term: Vec<BTreeSet<usize>> = expr
            .terms
            .iter()
            .map(|t| term_docs(postings, &t.normalized, t.prefix))
            .collect();
        let combined = if expr.or_terms {
            per_term.into_iter().flatten().collect()
        } else {
            per_term
                .into_iter()
                .fold(None, intersect)
                .unwrap_or_default()
        };
        candidates = intersect(candidates, combined);
    }

    candidates.unwrap_or_else(|| all_docs(doc_count))
}

fn select_candidates(texts: &[SearchableText], query: &CompiledQuery) -> Vec<usize> {
    let postings = build_postings(texts);
    let mut overall: Option<BTreeSet<usize>> = None;
    for clause in &query.clauses {
        overall = intersect(overall, clause_candidates(clause, &postings, texts.len()));
    }
    let selected = overall.unwrap_or_else(|| all_docs(texts.len()));
    debug!(
        docs = texts.len(),
        dictionary = postings.len(),
        candidates = selected.len(),
        "inverted candidate selection"
    );
    selected.into_iter().collect()
}

impl SearchEngine for InvertedEngine {
    fn name(&self) -> &'static str {
        "inverted"
    }

    fn search_posts(
        &self,
        store: &dyn ContentStore,
        request: &PostSearchRequest<'_>,
        cancel: &CancelToken,
    ) -> SearchResult<PostSearchResults> {
        self.ensure_available()?;
        debug!(engine = self.name(), "running post search");
        executor::run_post_search(store, request, cancel, select_candidates)
    }

    fn autocomplete_users_in_channel(
        &self,
        store: &dyn ContentStore,
        team_id: &str,
        channel_id: &str,
        term: &str,
        options: &UserSearchOptions,
    ) -> SearchResult<UserAutocomplete> {
        self.ensure_available()?;
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
        self.ensure_available()?;
        executor::autocomplete_channels(store, user_id, team_id, term, include_deleted)
    }
}

//! Match reporting: which fragments of a post satisfied the query.
//!
//! Fragments keep the original casing of the content (the joined surface
//! form for separator-fragment hits, the whole-word-rounded span for
//! phrases). Order within a post's entry is not significant; the
//! conformance suite compares entries as unordered sets.

use crate::model::Post;
use crate::query::TermExpr;
use crate::results::PostSearchMatches;
use crate::text::{term_matches_token, term_prefix_matches_token, SearchableText};

fn push_distinct(fragments: &mut Vec<String>, fragment: &str) {
    if !fragments.iter().any(|f| f == fragment) {
        fragments.push(fragment.to_owned());
    }
}

fn expr_fragments(expr: &TermExpr, text: &SearchableText, fragments: &mut Vec<String>) {
    for phrase in &expr.phrases {
        if let Some(fragment) = text.find_phrase(&phrase.normalized) {
            push_distinct(fragments, fragment);
        }
    }
    for term in &expr.terms {
        for token in text.tokens() {
            let hit = if term.prefix {
                term_prefix_matches_token(&term.normalized, &token.normalized)
            } else {
                term_matches_token(&term.normalized, &token.normalized)
            };
            if hit {
                push_distinct(fragments, &token.surface);
            }
        }
    }
}

/// Collect matched fragments for each post on a result page.
///
/// Posts whose clauses are filters-only (no term or phrase hits) get no
/// entry at all rather than an empty one.
#[must_use]
pub fn build_matches(exprs: &[TermExpr], posts: &[Post]) -> PostSearchMatches {
    let mut matches = PostSearchMatches::new();
    for post in posts {
        let text = SearchableText::new(&post.message);
        let mut fragments = Vec::new();
        for expr in exprs {
            expr_fragments(expr, &text, &mut fragments);
        }
        if !fragments.is_empty() {
            matches.insert(post.id.clone(), fragments);
        }
    }
    matches
}

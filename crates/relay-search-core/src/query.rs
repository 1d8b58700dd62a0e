//! Search query model and parser.
//!
//! [`SearchParams`] is the structured form of a post-search query string.
//! Callers can build it directly (the store-level API takes a slice of them)
//! or let [`parse_search_params`] split a raw query like
//! `"exact phrase" budget from:@ana in:town-square after:2024-02-01`
//! into modifier clauses and free text. Engines compile the `terms` /
//! `excluded_terms` strings into a [`TermExpr`] via [`compile_terms`].

use serde::{Deserialize, Serialize};

use crate::error::{SearchError, SearchResult};
use crate::model::{ChannelId, TeamId, UserId};
use crate::text::{normalize, normalize_phrase};

/// Default result cap for user autocomplete
pub const USER_SEARCH_DEFAULT_LIMIT: usize = 100;

/// Structured post-search parameters.
///
/// `terms` and `excluded_terms` hold raw space-separated terms and quoted
/// phrases; they are mutually exclusive vocabularies evaluated as
/// must-match and must-not-match respectively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    /// Terms and quoted phrases that must match
    #[serde(default)]
    pub terms: String,
    /// Terms and quoted phrases that must not match
    #[serde(default)]
    pub excluded_terms: String,
    /// OR the terms of this clause instead of ANDing them
    #[serde(default)]
    pub is_or_search: bool,
    /// Restrict to posts authored by these users (ids or usernames)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from_users: Vec<UserId>,
    /// Exclude posts authored by these users
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_users: Vec<UserId>,
    /// Restrict to these channels (ids or names)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub in_channels: Vec<ChannelId>,
    /// Exclude these channels
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_channels: Vec<ChannelId>,
    /// Only posts created strictly after this timestamp (millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_date: Option<i64>,
    /// Only posts created strictly before this timestamp (millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_date: Option<i64>,
    /// Include posts from archived channels
    #[serde(default)]
    pub include_deleted_channels: bool,
}

impl SearchParams {
    /// Convenience constructor for a plain terms query
    #[must_use]
    pub fn for_terms(terms: impl Into<String>) -> Self {
        Self {
            terms: terms.into(),
            ..Self::default()
        }
    }
}

/// View-restriction overrides applied on top of membership.
///
/// An *absent* dimension means unrestricted; a *present-but-empty* set means
/// no access to anything in that dimension. The distinction is load-bearing
/// and must never be collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRestrictions {
    /// Teams the searcher may see, if restricted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<TeamId>>,
    /// Channels the searcher may see, if restricted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<ChannelId>>,
}

/// Options for user autocomplete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSearchOptions {
    /// Match against first/last name and nickname in addition to username
    #[serde(default)]
    pub allow_full_names: bool,
    /// Match against email local part, domain, and full address
    #[serde(default)]
    pub allow_emails: bool,
    /// Include deactivated accounts
    #[serde(default)]
    pub allow_inactive: bool,
    /// Maximum users returned per partition
    pub limit: usize,
    /// View-restriction overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_restrictions: Option<ViewRestrictions>,
    /// Simple channel allow-list; behaves like `ViewRestrictions.channels`
    /// without the team dimension
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_of_allowed_channels: Option<Vec<ChannelId>>,
}

impl Default for UserSearchOptions {
    fn default() -> Self {
        Self {
            allow_full_names: false,
            allow_emails: false,
            allow_inactive: false,
            limit: USER_SEARCH_DEFAULT_LIMIT,
            view_restrictions: None,
            list_of_allowed_channels: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────
// Raw query parsing
// ────────────────────────────────────────────────────────────────────

/// Quote-aware whitespace split. Errors on an unbalanced quote.
fn split_query_tokens(raw_query: &str) -> SearchResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in raw_query.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
            current.push(ch);
            continue;
        }
        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }
    }
    if in_quotes {
        return Err(SearchError::InvalidQuery(
            "unbalanced quote in query".to_owned(),
        ));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn strip_value_decorations(value: &str) -> &str {
    let unquoted = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    let unhandled = unquoted.strip_prefix('@').unwrap_or(unquoted);
    unhandled.strip_prefix('~').unwrap_or(unhandled)
}

/// Milliseconds at 00:00:00 UTC of a `YYYY-MM-DD` date
fn parse_date_millis(field: &str, value: &str) -> SearchResult<i64> {
    let date = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        SearchError::InvalidQuery(format!("invalid date for {field}: {value:?}"))
    })?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| SearchError::InvalidQuery(format!("invalid date for {field}: {value:?}")))?;
    Ok(midnight.and_utc().timestamp_millis())
}

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Parse a raw query string into structured search parameters.
///
/// Recognized modifiers: `from:`, `in:` (alias `channel:`), their `-`
/// negations, and `after:` / `before:` dates. A bare `or` token switches the
/// clause to OR semantics. Everything else — including terms with leading or
/// trailing hyphens — stays literal free text; the tokenizer treats such
/// hyphens as token boundaries, never as syntax.
///
/// Returns an empty vector when the query carries no content at all.
pub fn parse_search_params(raw_query: &str) -> SearchResult<Vec<SearchParams>> {
    let mut params = SearchParams::default();
    let mut free_text: Vec<String> = Vec::new();
    let mut excluded_text: Vec<String> = Vec::new();

    for token in split_query_tokens(raw_query)? {
        if token.eq_ignore_ascii_case("or") {
            params.is_or_search = true;
            continue;
        }

        // excluded phrase: -"some words"
        if let Some(phrase) = token.strip_prefix("-\"") {
            if phrase.ends_with('"') {
                excluded_text.push(format!("\"{phrase}"));
                continue;
            }
        }

        let (negated, body) = match token.strip_prefix('-') {
            // only a modifier may be negated; "-mobile" stays a literal term
            Some(rest) if rest.contains(':') => (true, rest),
            _ => (false, token.as_str()),
        };

        let Some((field, value)) = body.split_once(':') else {
            free_text.push(token);
            continue;
        };
        if value.is_empty() {
            free_text.push(token);
            continue;
        }

        match field.to_ascii_lowercase().as_str() {
            "from" => {
                let user = strip_value_decorations(value).to_owned();
                if negated {
                    params.excluded_users.push(user);
                } else {
                    params.from_users.push(user);
                }
            }
            "in" | "channel" => {
                let channel = strip_value_decorations(value).to_owned();
                if negated {
                    params.excluded_channels.push(channel);
                } else {
                    params.in_channels.push(channel);
                }
            }
            "after" if !negated => {
                params.after_date = Some(parse_date_millis(field, value)? + MILLIS_PER_DAY - 1);
            }
            "before" if !negated => {
                params.before_date = Some(parse_date_millis(field, value)?);
            }
            _ => free_text.push(token),
        }
    }

    params.terms = free_text.join(" ");
    params.excluded_terms = excluded_text.join(" ");

    let has_content = !params.terms.is_empty()
        || !params.excluded_terms.is_empty()
        || !params.from_users.is_empty()
        || !params.excluded_users.is_empty()
        || !params.in_channels.is_empty()
        || !params.excluded_channels.is_empty()
        || params.after_date.is_some()
        || params.before_date.is_some();

    if has_content {
        Ok(vec![params])
    } else {
        Ok(Vec::new())
    }
}

// ────────────────────────────────────────────────────────────────────
// Term compilation
// ────────────────────────────────────────────────────────────────────

/// A single free-text term, possibly marked as a trailing-wildcard prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSpec {
    /// Normalized matching form (wildcard marker stripped)
    pub normalized: String,
    /// Trailing `*` was present: match by prefix
    pub prefix: bool,
}

/// A quoted exact phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseSpec {
    /// Normalized single-spaced form
    pub normalized: String,
}

/// Compiled boolean expression for one `terms` / `excluded_terms` string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermExpr {
    /// Quoted phrases; always conjunctive
    pub phrases: Vec<PhraseSpec>,
    /// Bare terms; conjunctive unless `or_terms`
    pub terms: Vec<TermSpec>,
    /// OR the bare terms instead of ANDing them
    pub or_terms: bool,
}

impl TermExpr {
    /// `true` when there is nothing to match on
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty() && self.terms.is_empty()
    }
}

/// Compile a raw terms string into phrases and wildcard-aware terms.
///
/// Wildcards are trailing-only for every engine; a leading `*` has no
/// special meaning and stays in the term literally, so such a term only
/// matches text that actually contains the asterisk. A leading `@` is
/// punctuation, not syntax, and is stripped.
pub fn compile_terms(raw_terms: &str, or_terms: bool) -> SearchResult<TermExpr> {
    let mut expr = TermExpr {
        or_terms,
        ..TermExpr::default()
    };

    for token in split_query_tokens(raw_terms)? {
        if let Some(inner) = token.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
            let normalized = normalize_phrase(inner);
            if !normalized.is_empty() {
                expr.phrases.push(PhraseSpec { normalized });
            }
            continue;
        }

        let body = token.strip_prefix('@').unwrap_or(&token);
        let (body, prefix) = match body.strip_suffix('*') {
            Some(stem) => (stem.trim_end_matches('*'), true),
            None => (body, false),
        };
        let normalized = normalize(body);
        if !normalized.is_empty() {
            expr.terms.push(TermSpec { normalized, prefix });
        }
    }

    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_terms() {
        let parsed = parse_search_params("channel test").unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].terms, "channel test");
        assert!(!parsed[0].is_or_search);
        assert!(parsed[0].from_users.is_empty());
    }

    #[test]
    fn parse_empty_query_yields_nothing() {
        assert!(parse_search_params("").unwrap().is_empty());
        assert!(parse_search_params("   ").unwrap().is_empty());
    }

    #[test]
    fn parse_from_and_in_modifiers() {
        let parsed = parse_search_params("budget from:@ana in:~town-square").unwrap();
        let p = &parsed[0];
        assert_eq!(p.terms, "budget");
        assert_eq!(p.from_users, vec!["ana".to_owned()]);
        assert_eq!(p.in_channels, vec!["town-square".to_owned()]);
    }

    #[test]
    fn parse_negated_modifiers() {
        let parsed = parse_search_params("report -from:bob -in:random").unwrap();
        let p = &parsed[0];
        assert_eq!(p.excluded_users, vec!["bob".to_owned()]);
        assert_eq!(p.excluded_channels, vec!["random".to_owned()]);
        assert_eq!(p.terms, "report");
    }

    #[test]
    fn leading_hyphen_term_stays_literal() {
        let parsed = parse_search_params("-mobile").unwrap();
        assert_eq!(parsed[0].terms, "-mobile");
        assert!(parsed[0].excluded_terms.is_empty());
    }

    #[test]
    fn trailing_hyphen_term_stays_literal() {
        let parsed = parse_search_params("mobile-").unwrap();
        assert_eq!(parsed[0].terms, "mobile-");
    }

    #[test]
    fn excluded_phrase_goes_to_excluded_terms() {
        let parsed = parse_search_params("keep -\"drop this\"").unwrap();
        assert_eq!(parsed[0].terms, "keep");
        assert_eq!(parsed[0].excluded_terms, "\"drop this\"");
    }

    #[test]
    fn or_token_switches_semantics() {
        let parsed = parse_search_params("alpha or beta").unwrap();
        assert!(parsed[0].is_or_search);
        assert_eq!(parsed[0].terms, "alpha beta");
    }

    #[test]
    fn quoted_phrase_kept_verbatim() {
        let parsed = parse_search_params("\"channel test 1 2 3\"").unwrap();
        assert_eq!(parsed[0].terms, "\"channel test 1 2 3\"");
    }

    #[test]
    fn unbalanced_quote_is_invalid() {
        let err = parse_search_params("\"channel test").unwrap_err();
        assert_eq!(err.error_type(), "INVALID_QUERY");
        assert!(!err.is_retryable());
    }

    #[test]
    fn date_modifiers() {
        let parsed = parse_search_params("after:2024-02-01 before:2024-03-01 x").unwrap();
        let p = &parsed[0];
        let after = p.after_date.unwrap();
        let before = p.before_date.unwrap();
        // after is inclusive of nothing on that day; before cuts at midnight
        assert_eq!((after + 1) % MILLIS_PER_DAY, 0);
        assert_eq!(before % MILLIS_PER_DAY, 0);
        assert!(after < before);
    }

    #[test]
    fn bad_date_is_invalid_query() {
        let err = parse_search_params("after:yesterday").unwrap_err();
        assert_eq!(err.error_type(), "INVALID_QUERY");
    }

    #[test]
    fn compile_terms_splits_phrases_and_wildcards() {
        let expr = compile_terms("\"exact phrase\" budget* plan", false).unwrap();
        assert_eq!(expr.phrases.len(), 1);
        assert_eq!(expr.phrases[0].normalized, "exact phrase");
        assert_eq!(
            expr.terms,
            vec![
                TermSpec {
                    normalized: "budget".into(),
                    prefix: true
                },
                TermSpec {
                    normalized: "plan".into(),
                    prefix: false
                },
            ]
        );
    }

    #[test]
    fn compile_terms_strips_leading_at() {
        let expr = compile_terms("@ana.username", false).unwrap();
        assert_eq!(expr.terms[0].normalized, "ana.username");
    }

    #[test]
    fn compile_terms_keeps_leading_asterisk_literal() {
        let expr = compile_terms("*mobile", false).unwrap();
        assert_eq!(
            expr.terms,
            vec![TermSpec {
                normalized: "*mobile".into(),
                prefix: false
            }]
        );
    }

    #[test]
    fn compile_terms_normalizes() {
        let expr = compile_terms("Straße", false).unwrap();
        assert_eq!(expr.terms[0].normalized, "strasse");
    }

    #[test]
    fn compile_empty_terms() {
        let expr = compile_terms("", false).unwrap();
        assert!(expr.is_empty());
    }

    #[test]
    fn view_restrictions_empty_vs_absent_survive_serde() {
        let absent = ViewRestrictions::default();
        let empty = ViewRestrictions {
            channels: Some(Vec::new()),
            teams: None,
        };
        let absent_json = serde_json::to_string(&absent).unwrap();
        let empty_json = serde_json::to_string(&empty).unwrap();
        assert_ne!(absent_json, empty_json);

        let back: ViewRestrictions = serde_json::from_str(&empty_json).unwrap();
        assert_eq!(back.channels.as_deref(), Some(&[][..]));
        assert!(back.teams.is_none());
    }

    #[test]
    fn user_search_options_default_limit() {
        let options = UserSearchOptions::default();
        assert_eq!(options.limit, USER_SEARCH_DEFAULT_LIMIT);
        assert!(!options.allow_inactive);
    }

    #[test]
    fn search_params_serde_roundtrip() {
        let params = SearchParams {
            terms: "channel test".into(),
            from_users: vec!["u1".into()],
            after_date: Some(1000),
            ..SearchParams::default()
        };
        let json = serde_json::to_string(&params).unwrap();
        let back: SearchParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back.terms, "channel test");
        assert_eq!(back.from_users, vec!["u1".to_owned()]);
        assert_eq!(back.after_date, Some(1000));
        assert!(back.excluded_channels.is_empty());
    }
}

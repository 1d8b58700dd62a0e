//! Tokenization and normalization for search matching.
//!
//! Converts raw post/channel/user text into a deterministic searchable form
//! shared by every engine implementation:
//!
//! 1. Strip markdown emphasis so wrapped words match bare
//! 2. Normalize Unicode (NFC), lowercase, and fold alternate spellings
//! 3. Split into tokens on whitespace and the separator set `- _ . , @`,
//!    keeping the joined surface form searchable alongside its parts
//! 4. Emit CJK and Hangul characters as individually matchable tokens
//!
//! # Accent policy
//!
//! Accent folding is *not* applied. Composed and decomposed forms of the same
//! accented word unify through NFC (`café` matches `café` however it was
//! typed), but `cafe` never matches `café`. The only cross-spelling rules are
//! the explicit fold table: `ß`→`ss`, `æ`→`ae`, `œ`→`oe`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Characters that join token parts without ending the joined form
const fn is_separator(c: char) -> bool {
    matches!(c, '-' | '_' | '.' | ',' | '@')
}

const fn is_separator_byte(b: u8) -> bool {
    matches!(b, b'-' | b'_' | b'.' | b',' | b'@')
}

// ────────────────────────────────────────────────────────────────────
// Script classification
// ────────────────────────────────────────────────────────────────────

/// Writing-system class of a token, used to decide character-level matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptClass {
    /// Latin letters (including diacritic variants)
    Latin,
    /// Cyrillic letters
    Cyrillic,
    /// Han, Hiragana, or Katakana characters
    Cjk,
    /// Hangul syllables and jamo
    Hangul,
    /// Digits, symbols, or anything else
    Other,
}

impl ScriptClass {
    /// Classify a single character
    #[must_use]
    pub const fn of_char(c: char) -> Self {
        match c as u32 {
            0x0041..=0x005A | 0x0061..=0x007A | 0x00C0..=0x024F => Self::Latin,
            0x0400..=0x04FF | 0x0500..=0x052F => Self::Cyrillic,
            0x3040..=0x30FF | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF => Self::Cjk,
            0x1100..=0x11FF | 0xAC00..=0xD7AF => Self::Hangul,
            _ => Self::Other,
        }
    }

    /// Classify a string by its first alphabetic character
    #[must_use]
    pub fn of(s: &str) -> Self {
        s.chars()
            .map(Self::of_char)
            .find(|class| !matches!(class, Self::Other))
            .unwrap_or(Self::Other)
    }
}

// ────────────────────────────────────────────────────────────────────
// Normalization
// ────────────────────────────────────────────────────────────────────

/// Normalize text for matching: NFC composition, lowercase, and the
/// alternate-spelling fold table.
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
#[must_use]
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.nfc() {
        for lower in ch.to_lowercase() {
            match lower {
                'ß' => out.push_str("ss"),
                'æ' => out.push_str("ae"),
                'œ' => out.push_str("oe"),
                _ => out.push(lower),
            }
        }
    }
    out
}

/// Normalize a quoted phrase: each word normalized, internal whitespace
/// collapsed to single spaces.
#[must_use]
pub fn normalize_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(normalize)
        .collect::<Vec<_>>()
        .join(" ")
}

// ────────────────────────────────────────────────────────────────────
// Markdown stripping
// ────────────────────────────────────────────────────────────────────

/// Strip markdown emphasis wrapping so enclosed words are matchable bare.
///
/// Word-boundary anchors protect snake_case identifiers: `user_name` keeps
/// its underscore, `_emphasized words_` lose theirs.
#[must_use]
pub fn strip_markdown(input: &str) -> String {
    static RE_ASTERISK: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\*{1,3}([^*]+)\*{1,3}").expect("asterisk emphasis regex"));
    static RE_UNDERSCORE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\b_{1,3}([^_]+)_{1,3}\b").expect("underscore emphasis regex"));

    let text = RE_ASTERISK.replace_all(input, "$1");
    RE_UNDERSCORE.replace_all(&text, "$1").into_owned()
}

// ────────────────────────────────────────────────────────────────────
// Tokens
// ────────────────────────────────────────────────────────────────────

/// A searchable unit of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Original text as it appears in the content (casing preserved)
    pub surface: String,
    /// Matching form; see [`normalize`]
    pub normalized: String,
    /// Writing-system class
    pub script: ScriptClass,
}

impl Token {
    fn new(surface: &str) -> Self {
        Self {
            surface: surface.to_owned(),
            normalized: normalize(surface),
            script: ScriptClass::of(surface),
        }
    }
}

/// Split text into searchable tokens.
///
/// Each whitespace-delimited word yields its joined form, its parts split on
/// the separator set, and one token per CJK/Hangul character. Leading and
/// trailing punctuation on a word is trimmed (`searchable!` → `searchable`),
/// which also removes any emphasis markers the regex pass left behind.
#[must_use]
pub fn tokenize(text: &str) -> Vec<Token> {
    let stripped = strip_markdown(text);
    let mut tokens = Vec::new();
    for word in stripped.split_whitespace() {
        push_word_tokens(word, &mut tokens);
    }
    tokens
}

fn push_word_tokens(word: &str, out: &mut Vec<Token>) {
    let core = word.trim_matches(|c: char| !c.is_alphanumeric());
    if core.is_empty() {
        return;
    }

    out.push(Token::new(core));

    let parts: Vec<&str> = core.split(is_separator).filter(|p| !p.is_empty()).collect();
    if parts.len() > 1 {
        for part in parts {
            out.push(Token::new(part));
        }
    }

    for ch in core.chars() {
        if matches!(
            ScriptClass::of_char(ch),
            ScriptClass::Cjk | ScriptClass::Hangul
        ) {
            let mut buf = [0u8; 4];
            out.push(Token::new(ch.encode_utf8(&mut buf)));
        }
    }
}

// ────────────────────────────────────────────────────────────────────
// Matching primitives
// ────────────────────────────────────────────────────────────────────

/// Boundary-aligned term match against a token's normalized form.
///
/// `term` must already be normalized. A term matches on exact equality, or
/// as a substring of the joined form whose both ends land on a separator
/// boundary. A term that itself starts or ends with a separator supplies
/// its own boundary, so `-mobile` matches `native-mobile-apps` while
/// `ativemobile` does not.
#[must_use]
pub fn term_matches_token(term: &str, token_norm: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    if term == token_norm {
        return true;
    }

    let bytes = token_norm.as_bytes();
    let term_self_starts = term.starts_with(is_separator);
    let term_self_ends = term.ends_with(is_separator);

    for (i, _) in token_norm.match_indices(term) {
        let start_ok = i == 0 || is_separator_byte(bytes[i - 1]) || term_self_starts;
        let j = i + term.len();
        let end_ok = j == bytes.len() || is_separator_byte(bytes[j]) || term_self_ends;
        if start_ok && end_ok {
            return true;
        }
    }
    false
}

/// Prefix match for trailing-wildcard terms (`term` already normalized)
#[must_use]
pub fn term_prefix_matches_token(term: &str, token_norm: &str) -> bool {
    !term.is_empty() && token_norm.starts_with(term)
}

// ────────────────────────────────────────────────────────────────────
// Searchable text (word-aligned normalized view)
// ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct WordSpan {
    norm_start: usize,
    norm_end: usize,
    orig_start: usize,
    orig_end: usize,
}

/// A post/channel text prepared for matching: markdown-stripped original,
/// a word-aligned normalized view for phrase matching, and the token list.
///
/// Request-scoped; built once per candidate and discarded with the query.
#[derive(Debug, Clone)]
pub struct SearchableText {
    stripped: String,
    normalized: String,
    word_spans: Vec<WordSpan>,
    tokens: Vec<Token>,
}

impl SearchableText {
    /// Prepare raw content for matching
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let stripped = strip_markdown(raw);

        let mut normalized = String::with_capacity(stripped.len());
        let mut word_spans = Vec::new();
        let mut tokens = Vec::new();

        for (orig_start, word) in word_offsets(&stripped) {
            let core = word.trim_matches(|c: char| !c.is_alphanumeric());
            push_word_tokens(word, &mut tokens);

            let norm_word = normalize(core);
            if norm_word.is_empty() {
                continue;
            }
            if !normalized.is_empty() {
                normalized.push(' ');
            }
            let norm_start = normalized.len();
            normalized.push_str(&norm_word);
            word_spans.push(WordSpan {
                norm_start,
                norm_end: normalized.len(),
                orig_start,
                orig_end: orig_start + word.len(),
            });
        }

        Self {
            stripped,
            normalized,
            word_spans,
            tokens,
        }
    }

    /// Tokens extracted from the content
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Whole-text normalized view (word-aligned, single-spaced)
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Find a normalized phrase as a boundary-aligned contiguous run.
    ///
    /// Returns the matched fragment with original casing, rounded to whole
    /// words of the stripped content. `channel test 1 2 3` does not match
    /// content saying `channel test 123`.
    #[must_use]
    pub fn find_phrase(&self, phrase_norm: &str) -> Option<&str> {
        if phrase_norm.is_empty() {
            return None;
        }
        let bytes = self.normalized.as_bytes();
        for (start, _) in self.normalized.match_indices(phrase_norm) {
            let end = start + phrase_norm.len();
            let start_ok = start == 0 || !char_before(&self.normalized, start).is_alphanumeric();
            let end_ok =
                end == bytes.len() || !char_at(&self.normalized, end).is_alphanumeric();
            if start_ok && end_ok {
                return self.fragment_for_range(start, end);
            }
        }
        None
    }

    fn fragment_for_range(&self, norm_start: usize, norm_end: usize) -> Option<&str> {
        let first = self
            .word_spans
            .iter()
            .find(|span| span.norm_end > norm_start)?;
        let last = self
            .word_spans
            .iter()
            .rev()
            .find(|span| span.norm_start < norm_end)?;
        self.stripped.get(first.orig_start..last.orig_end)
    }
}

fn char_before(s: &str, idx: usize) -> char {
    s[..idx].chars().next_back().unwrap_or(' ')
}

fn char_at(s: &str, idx: usize) -> char {
    s[idx..].chars().next().unwrap_or(' ')
}

/// Byte-offset + slice of each whitespace-delimited word
fn word_offsets(s: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;
    for (i, c) in s.char_indices() {
        if c.is_whitespace() {
            if let Some(st) = start.take() {
                words.push((st, &s[st..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(st) = start {
        words.push((st, &s[st..]));
    }
    words
}

// ────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────

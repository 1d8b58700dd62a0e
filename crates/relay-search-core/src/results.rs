//! Result value objects returned by every engine.
//!
//! Conformance compares these across engines, so their shapes are part of
//! the contract: `posts` carries ranked order, `matches` covers only the
//! returned page, and match fragments compare as unordered sets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Post, PostId, User};

/// Per-post matched fragments, keyed by post id.
///
/// Fragments keep the original casing of the content; ordering within an
/// entry is not significant.
pub type PostSearchMatches = BTreeMap<PostId, Vec<String>>;

/// One page of a ranked post search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostSearchResults {
    /// Posts in rank order (relevance desc, `create_at` desc, id asc)
    pub posts: Vec<Post>,
    /// Matched fragments for the posts on this page
    pub matches: PostSearchMatches,
    /// Total matching posts before pagination
    pub total: usize,
}

impl PostSearchResults {
    /// Ranked post ids of this page
    #[must_use]
    pub fn order(&self) -> Vec<PostId> {
        self.posts.iter().map(|p| p.id.clone()).collect()
    }
}

/// User autocomplete partitioned by channel membership
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserAutocomplete {
    /// Matching members of the channel
    pub in_channel: Vec<User>,
    /// Matching team members who are not in the channel
    pub out_of_channel: Vec<User>,
}

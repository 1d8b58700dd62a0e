//! Domain rows the search core reads.
//!
//! These mirror the platform's persisted entities (teams, channels, users,
//! posts) but carry only the fields search needs. Search is strictly
//! read-only with respect to all of them; persistence and CRUD live in the
//! store layer behind [`crate::store::ContentStore`].

use serde::{Deserialize, Serialize};

/// Unique identifier for a team (26-char alphanumeric in production)
pub type TeamId = String;
/// Unique identifier for a channel
pub type ChannelId = String;
/// Unique identifier for a user
pub type UserId = String;
/// Unique identifier for a post
pub type PostId = String;

/// A team: the top-level scoping container for channels and memberships
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Unique ID
    pub id: TeamId,
    /// URL-safe name (e.g. `test-team`)
    pub name: String,
    /// Human-readable display name
    pub display_name: String,
}

/// Channel visibility / conversation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Public channel, visible to every team member
    Open,
    /// Private channel, visible to members only
    Private,
    /// 1:1 direct-message conversation
    Direct,
    /// Group-message conversation
    Group,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Private => write!(f, "private"),
            Self::Direct => write!(f, "direct"),
            Self::Group => write!(f, "group"),
        }
    }
}

/// A channel inside a team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// Unique ID
    pub id: ChannelId,
    /// Owning team
    pub team_id: TeamId,
    /// URL-safe name (e.g. `native-mobile-apps`)
    pub name: String,
    /// Human-readable display name (e.g. `Native Mobile Apps`)
    pub display_name: String,
    /// Searchable purpose text
    #[serde(default)]
    pub purpose: String,
    /// Visibility kind
    pub kind: ChannelKind,
    /// Archive timestamp in milliseconds since epoch; `None` while active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

impl Channel {
    /// Returns `true` if the channel has been archived
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique ID
    pub id: UserId,
    /// Unique handle (e.g. `user.one-dev`)
    pub username: String,
    /// Optional nickname
    #[serde(default)]
    pub nickname: String,
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Email address
    pub email: String,
    /// Deactivation timestamp in milliseconds since epoch; `None` while active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated_at: Option<i64>,
}

impl User {
    /// Returns `true` if the account has been deactivated
    #[must_use]
    pub const fn is_deactivated(&self) -> bool {
        self.deactivated_at.is_some()
    }

    /// First and last name joined with a single space
    #[must_use]
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (true, true) => String::new(),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (false, false) => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

/// A message posted to a channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique ID
    pub id: PostId,
    /// Channel the post was written in
    pub channel_id: ChannelId,
    /// Author
    pub user_id: UserId,
    /// Raw message text (may contain markdown)
    pub message: String,
    /// Space-separated hashtags extracted at post time
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hashtags: String,
    /// Creation timestamp in milliseconds since epoch
    pub create_at: i64,
    /// Whether the post is pinned to its channel. Pinning never affects
    /// search ranking; the field exists so engines can prove that.
    #[serde(default)]
    pub is_pinned: bool,
}

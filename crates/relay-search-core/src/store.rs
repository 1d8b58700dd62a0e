//! Read-only store interface the search core runs against.
//!
//! Persistence, CRUD, and membership management live elsewhere; search only
//! needs these lookups. The one performance-relevant method is
//! [`ContentStore::posts_in_channels`]: its cost is proportional to the
//! candidate channel set, never to the whole corpus, which is what lets the
//! access scoper run *before* any content is touched.

use crate::error::StoreResult;
use crate::model::{Channel, ChannelId, Post, Team, TeamId, User, UserId};

/// Read-only access to teams, channels, users, and posts.
///
/// Implementations return `StoreError` for missing entities and backend
/// failures; those errors propagate through the search layer unchanged.
pub trait ContentStore {
    /// Look up a team by id
    fn get_team(&self, team_id: &str) -> StoreResult<Team>;

    /// Look up a channel by id
    fn get_channel(&self, channel_id: &str) -> StoreResult<Channel>;

    /// Look up a user by id
    fn get_user(&self, user_id: &str) -> StoreResult<User>;

    /// Look up a post by id
    fn get_post(&self, post_id: &str) -> StoreResult<Post>;

    /// All channels belonging to a team, archived ones included
    fn team_channels(&self, team_id: &str) -> StoreResult<Vec<Channel>>;

    /// Ids of the channels a user is a member of, scoped to a team.
    ///
    /// Direct and group conversations belong to no team and are always
    /// included for their members.
    fn user_channel_ids(&self, user_id: &str, team_id: &str) -> StoreResult<Vec<ChannelId>>;

    /// Ids of a channel's members
    fn channel_member_ids(&self, channel_id: &str) -> StoreResult<Vec<UserId>>;

    /// Ids of a team's members
    fn team_member_ids(&self, team_id: &str) -> StoreResult<Vec<UserId>>;

    /// Ids of the teams a user belongs to
    fn user_team_ids(&self, user_id: &str) -> StoreResult<Vec<TeamId>>;

    /// Bulk user lookup; unknown ids are skipped, not errors
    fn users_by_ids(&self, user_ids: &[UserId]) -> StoreResult<Vec<User>>;

    /// All posts in the given channels, in no particular order
    fn posts_in_channels(&self, channel_ids: &[ChannelId]) -> StoreResult<Vec<Post>>;
}

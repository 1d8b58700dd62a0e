//! In-memory [`ContentStore`] used by the conformance suite.
//!
//! Plain owned maps, no interior mutability: each test case builds its own
//! store, mutates it while seeding, then hands out `&MemStore` to engines.

use std::collections::{BTreeMap, BTreeSet};

use relay_search_core::{
    Channel, ChannelId, ChannelKind, ContentStore, Post, StoreError, StoreResult, Team, TeamId,
    User, UserId,
};

/// Owned in-memory content store
#[derive(Debug, Default)]
pub struct MemStore {
    teams: BTreeMap<TeamId, Team>,
    channels: BTreeMap<ChannelId, Channel>,
    users: BTreeMap<UserId, User>,
    posts: BTreeMap<String, Post>,
    channel_members: BTreeMap<ChannelId, BTreeSet<UserId>>,
    team_members: BTreeMap<TeamId, BTreeSet<UserId>>,
}

impl MemStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_team(&mut self, team: Team) {
        self.teams.insert(team.id.clone(), team);
    }

    pub fn put_channel(&mut self, channel: Channel) {
        self.channels.insert(channel.id.clone(), channel);
    }

    pub fn put_user(&mut self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn put_post(&mut self, post: Post) {
        self.posts.insert(post.id.clone(), post);
    }

    pub fn add_team_member(&mut self, team_id: &str, user_id: &str) {
        self.team_members
            .entry(team_id.to_owned())
            .or_default()
            .insert(user_id.to_owned());
    }

    pub fn add_channel_member(&mut self, channel_id: &str, user_id: &str) {
        self.channel_members
            .entry(channel_id.to_owned())
            .or_default()
            .insert(user_id.to_owned());
    }

    /// Mark a user deactivated at the given timestamp
    pub fn deactivate_user(&mut self, user_id: &str, at: i64) {
        if let Some(user) = self.users.get_mut(user_id) {
            user.deactivated_at = Some(at);
        }
    }

    /// Archive a channel at the given timestamp
    pub fn archive_channel(&mut self, channel_id: &str, at: i64) {
        if let Some(channel) = self.channels.get_mut(channel_id) {
            channel.deleted_at = Some(at);
        }
    }
}

impl ContentStore for MemStore {
    fn get_team(&self, team_id: &str) -> StoreResult<Team> {
        self.teams
            .get(team_id)
            .cloned()
            .ok_or_else(|| StoreError::TeamNotFound(team_id.to_owned()))
    }

    fn get_channel(&self, channel_id: &str) -> StoreResult<Channel> {
        self.channels
            .get(channel_id)
            .cloned()
            .ok_or_else(|| StoreError::ChannelNotFound(channel_id.to_owned()))
    }

    fn get_user(&self, user_id: &str) -> StoreResult<User> {
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_owned()))
    }

    fn get_post(&self, post_id: &str) -> StoreResult<Post> {
        self.posts
            .get(post_id)
            .cloned()
            .ok_or_else(|| StoreError::PostNotFound(post_id.to_owned()))
    }

    fn team_channels(&self, team_id: &str) -> StoreResult<Vec<Channel>> {
        Ok(self
            .channels
            .values()
            .filter(|c| c.team_id == team_id)
            .cloned()
            .collect())
    }

    fn user_channel_ids(&self, user_id: &str, team_id: &str) -> StoreResult<Vec<ChannelId>> {
        Ok(self
            .channel_members
            .iter()
            .filter(|(channel_id, members)| {
                members.contains(user_id)
                    && self.channels.get(*channel_id).is_some_and(|c| {
                        c.team_id == team_id
                            || matches!(c.kind, ChannelKind::Direct | ChannelKind::Group)
                    })
            })
            .map(|(channel_id, _)| channel_id.clone())
            .collect())
    }

    fn channel_member_ids(&self, channel_id: &str) -> StoreResult<Vec<UserId>> {
        Ok(self
            .channel_members
            .get(channel_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn team_member_ids(&self, team_id: &str) -> StoreResult<Vec<UserId>> {
        Ok(self
            .team_members
            .get(team_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn user_team_ids(&self, user_id: &str) -> StoreResult<Vec<TeamId>> {
        Ok(self
            .team_members
            .iter()
            .filter(|(_, members)| members.contains(user_id))
            .map(|(team_id, _)| team_id.clone())
            .collect())
    }

    fn users_by_ids(&self, user_ids: &[UserId]) -> StoreResult<Vec<User>> {
        Ok(user_ids
            .iter()
            .filter_map(|id| self.users.get(id))
            .cloned()
            .collect())
    }

    fn posts_in_channels(&self, channel_ids: &[ChannelId]) -> StoreResult<Vec<Post>> {
        Ok(self
            .posts
            .values()
            .filter(|p| channel_ids.contains(&p.channel_id))
            .cloned()
            .collect())
    }
}

//! Minimal in-memory `ContentStore` for unit tests inside this crate.
//!
//! The conformance crate carries the full fixture arena; this stub only
//! covers what the scoper/executor/engine unit tests need.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{StoreError, StoreResult};
use crate::model::{Channel, ChannelId, ChannelKind, Post, Team, TeamId, User, UserId};
use crate::store::ContentStore;

#[derive(Debug, Default)]
pub struct StubStore {
    teams: BTreeMap<TeamId, Team>,
    channels: BTreeMap<ChannelId, Channel>,
    users: BTreeMap<UserId, User>,
    posts: BTreeMap<String, Post>,
    channel_members: BTreeMap<ChannelId, BTreeSet<UserId>>,
    team_members: BTreeMap<TeamId, BTreeSet<UserId>>,
}

impl StubStore {
    /// Two teams, three users, the basic channel menagerie, no posts
    pub fn standard() -> Self {
        let mut store = Self::default();

        store.add_team("t1", "test-team", "Test Team");
        store.add_team("t-other", "other-team", "Other Team");

        store.add_user("u1", "basicusername", "Basic", "User", "basic@example.com");
        store.add_user("u2", "basicusername2", "Second", "User", "second@example.com");
        store.add_user("u3", "otherteamuser", "Other", "Person", "other@example.com");

        store.add_channel("c-basic", "t1", "town-square", "Town Square", ChannelKind::Open, None);
        store.add_channel("c-alt", "t1", "alternate", "Alternate", ChannelKind::Open, None);
        store.add_channel("c-private", "t1", "private-ch", "Private", ChannelKind::Private, None);
        store.add_channel("c-deleted", "t1", "archived", "Archived", ChannelKind::Open, Some(1_000));
        store.add_channel("c-dm", "", "u1__u2", "u1__u2", ChannelKind::Direct, None);

        store.join_team("t1", &["u1", "u2"]);
        store.join_team("t-other", &["u3"]);
        store.join_channel("c-basic", &["u1", "u2"]);
        store.join_channel("c-alt", &["u2"]);
        store.join_channel("c-private", &["u1"]);
        store.join_channel("c-deleted", &["u1"]);
        store.join_channel("c-dm", &["u1", "u2"]);

        store
    }

    pub fn add_team(&mut self, id: &str, name: &str, display_name: &str) {
        self.teams.insert(
            id.to_owned(),
            Team {
                id: id.to_owned(),
                name: name.to_owned(),
                display_name: display_name.to_owned(),
            },
        );
    }

    pub fn add_user(&mut self, id: &str, username: &str, first: &str, last: &str, email: &str) {
        self.users.insert(
            id.to_owned(),
            User {
                id: id.to_owned(),
                username: username.to_owned(),
                nickname: String::new(),
                first_name: first.to_owned(),
                last_name: last.to_owned(),
                email: email.to_owned(),
                deactivated_at: None,
            },
        );
    }

    pub fn add_channel(
        &mut self,
        id: &str,
        team_id: &str,
        name: &str,
        display_name: &str,
        kind: ChannelKind,
        deleted_at: Option<i64>,
    ) {
        self.channels.insert(
            id.to_owned(),
            Channel {
                id: id.to_owned(),
                team_id: team_id.to_owned(),
                name: name.to_owned(),
                display_name: display_name.to_owned(),
                purpose: String::new(),
                kind,
                deleted_at,
            },
        );
    }

    pub fn add_post(&mut self, id: &str, channel_id: &str, user_id: &str, message: &str, create_at: i64) {
        self.posts.insert(
            id.to_owned(),
            Post {
                id: id.to_owned(),
                channel_id: channel_id.to_owned(),
                user_id: user_id.to_owned(),
                message: message.to_owned(),
                hashtags: String::new(),
                create_at,
                is_pinned: false,
            },
        );
    }

    pub fn join_team(&mut self, team_id: &str, user_ids: &[&str]) {
        let members = self.team_members.entry(team_id.to_owned()).or_default();
        members.extend(user_ids.iter().map(|id| (*id).to_owned()));
    }

    pub fn join_channel(&mut self, channel_id: &str, user_ids: &[&str]) {
        let members = self.channel_members.entry(channel_id.to_owned()).or_default();
        members.extend(user_ids.iter().map(|id| (*id).to_owned()));
    }
}

impl ContentStore for StubStore {
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
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn team_member_ids(&self, team_id: &str) -> StoreResult<Vec<UserId>> {
        Ok(self
            .team_members
            .get(team_id)
            .map(|m| m.iter().cloned().collect())
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

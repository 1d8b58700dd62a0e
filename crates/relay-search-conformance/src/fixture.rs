//! Per-test fixture arena.
//!
//! Every conformance case builds its own [`SearchFixture`]: two teams, two
//! users on the main team plus one on the other, and the channel menagerie
//! the case tables lean on (basic, private, hyphenated, whitespace display
//! name, archived). No shared global state; handles are owned.

use relay_search_core::{Channel, ChannelKind, Post, Team, User};

use crate::MemStore;

/// Owned arena for one conformance case
pub struct SearchFixture {
    pub store: MemStore,
    pub team: Team,
    pub another_team: Team,
    /// Primary searcher, member of every main-team channel here
    pub user: User,
    /// Second main-team user, member of the basic channel only
    pub user2: User,
    /// Member of the other team only
    pub user_another_team: User,
    pub channel_basic: Channel,
    pub channel_private: Channel,
    /// `native-mobile-apps` — separator-heavy name for boundary cases
    pub channel_hyphenated: Channel,
    /// Display name with internal whitespace
    pub channel_spaced: Channel,
    pub channel_deleted: Channel,
    pub channel_another_team: Channel,
    next_id: u64,
}

impl SearchFixture {
    #[must_use]
    pub fn new() -> Self {
        let mut store = MemStore::new();

        let team = Team {
            id: "team-main".into(),
            name: "main-team".into(),
            display_name: "Main Team".into(),
        };
        let another_team = Team {
            id: "team-other".into(),
            name: "other-team".into(),
            display_name: "Other Team".into(),
        };
        store.put_team(team.clone());
        store.put_team(another_team.clone());

        let user = make_user("user-basic", "basicusername", "basicnickname", "Basic", "User");
        let user2 = make_user("user-basic2", "basicusername2", "", "Basic2", "User2");
        let user_another_team = make_user("user-other", "otherteamuser", "", "Other", "Person");
        store.put_user(user.clone());
        store.put_user(user2.clone());
        store.put_user(user_another_team.clone());

        let channel_basic = make_channel("ch-basic", &team.id, "channel-a", "ChannelA", ChannelKind::Open);
        let channel_private = make_channel("ch-private", &team.id, "channel-private", "ChannelPrivate", ChannelKind::Private);
        let channel_hyphenated = make_channel("ch-hyphen", &team.id, "native-mobile-apps", "Native Mobile Apps", ChannelKind::Open);
        let channel_spaced = make_channel("ch-spaced", &team.id, "channel-spaced", "Channel With Spaces", ChannelKind::Open);
        let mut channel_deleted = make_channel("ch-deleted", &team.id, "channel-deleted", "ChannelDeleted", ChannelKind::Open);
        channel_deleted.deleted_at = Some(100);
        let channel_another_team = make_channel("ch-other-team", &another_team.id, "channel-b", "ChannelB", ChannelKind::Open);

        for channel in [
            &channel_basic,
            &channel_private,
            &channel_hyphenated,
            &channel_spaced,
            &channel_deleted,
            &channel_another_team,
        ] {
            store.put_channel(channel.clone());
        }

        store.add_team_member(&team.id, &user.id);
        store.add_team_member(&team.id, &user2.id);
        store.add_team_member(&another_team.id, &user_another_team.id);

        for channel_id in ["ch-basic", "ch-private", "ch-hyphen", "ch-spaced", "ch-deleted"] {
            store.add_channel_member(channel_id, &user.id);
        }
        store.add_channel_member("ch-basic", &user2.id);
        store.add_channel_member("ch-other-team", &user_another_team.id);

        Self {
            store,
            team,
            another_team,
            user,
            user2,
            user_another_team,
            channel_basic,
            channel_private,
            channel_hyphenated,
            channel_spaced,
            channel_deleted,
            channel_another_team,
            next_id: 0,
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    /// Seed a post; `create_at` doubles as the recency tiebreaker
    pub fn create_post(
        &mut self,
        channel_id: &str,
        user_id: &str,
        message: &str,
        create_at: i64,
    ) -> Post {
        self.create_pinned_post(channel_id, user_id, message, create_at, false)
    }

    pub fn create_pinned_post(
        &mut self,
        channel_id: &str,
        user_id: &str,
        message: &str,
        create_at: i64,
        is_pinned: bool,
    ) -> Post {
        let post = Post {
            id: self.next_id("post"),
            channel_id: channel_id.to_owned(),
            user_id: user_id.to_owned(),
            message: message.to_owned(),
            hashtags: String::new(),
            create_at,
            is_pinned,
        };
        self.store.put_post(post.clone());
        post
    }

    /// Seed a main-team user who is also a member of the basic channel
    pub fn create_user(
        &mut self,
        username: &str,
        nickname: &str,
        first_name: &str,
        last_name: &str,
    ) -> User {
        let user = User {
            id: self.next_id("user"),
            username: username.to_owned(),
            nickname: nickname.to_owned(),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            email: format!("{username}@example.com"),
            deactivated_at: None,
        };
        self.store.put_user(user.clone());
        self.store.add_team_member(&self.team.id, &user.id);
        self.store.add_channel_member(&self.channel_basic.id, &user.id);
        user
    }

    /// Seed an extra channel in the main team
    pub fn create_channel(&mut self, name: &str, display_name: &str, kind: ChannelKind) -> Channel {
        let channel = Channel {
            id: self.next_id("ch"),
            team_id: self.team.id.clone(),
            name: name.to_owned(),
            display_name: display_name.to_owned(),
            purpose: String::new(),
            kind,
            deleted_at: None,
        };
        self.store.put_channel(channel.clone());
        self.store.add_channel_member(&channel.id, &self.user.id);
        channel
    }

    /// Seed a direct-message conversation between two users
    pub fn create_direct_channel(&mut self, a: &User, b: &User) -> Channel {
        let name = format!("{}__{}", a.id, b.id);
        let channel = Channel {
            id: self.next_id("dm"),
            team_id: String::new(),
            name: name.clone(),
            display_name: name,
            purpose: String::new(),
            kind: ChannelKind::Direct,
            deleted_at: None,
        };
        self.store.put_channel(channel.clone());
        self.store.add_channel_member(&channel.id, &a.id);
        self.store.add_channel_member(&channel.id, &b.id);
        channel
    }

    /// Seed a group-message conversation
    pub fn create_group_channel(&mut self, members: &[&User]) -> Channel {
        let channel = Channel {
            id: self.next_id("gm"),
            team_id: String::new(),
            name: "group-message".into(),
            display_name: "Group Message".into(),
            purpose: String::new(),
            kind: ChannelKind::Group,
            deleted_at: None,
        };
        self.store.put_channel(channel.clone());
        for member in members {
            self.store.add_channel_member(&channel.id, &member.id);
        }
        channel
    }
}

impl Default for SearchFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn make_user(id: &str, username: &str, nickname: &str, first: &str, last: &str) -> User {
    User {
        id: id.to_owned(),
        username: username.to_owned(),
        nickname: nickname.to_owned(),
        first_name: first.to_owned(),
        last_name: last.to_owned(),
        email: format!("{username}@example.com"),
        deactivated_at: None,
    }
}

fn make_channel(id: &str, team_id: &str, name: &str, display_name: &str, kind: ChannelKind) -> Channel {
    Channel {
        id: id.to_owned(),
        team_id: team_id.to_owned(),
        name: name.to_owned(),
        display_name: display_name.to_owned(),
        purpose: String::new(),
        kind,
        deleted_at: None,
    }
}

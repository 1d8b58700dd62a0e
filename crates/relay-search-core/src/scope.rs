//! Access scoping: which channels and users a search may touch.
//!
//! Scope is resolved before any content is read, so out-of-scope posts never
//! contribute to ranking or pagination. Scope denial is never an error; an
//! empty scope simply yields empty results.
//!
//! View restrictions compose by intersection, and the absent/empty
//! distinction is preserved throughout: an absent dimension means
//! unrestricted, a present-but-empty one means no access at all.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::StoreResult;
use crate::model::{ChannelId, ChannelKind, UserId};
use crate::query::ViewRestrictions;
use crate::store::ContentStore;

/// Candidate channel set for a post search or channel autocomplete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelScope {
    /// No channel restriction beyond membership
    All,
    /// Only these channels are visible
    Channels(BTreeSet<ChannelId>),
}

impl ChannelScope {
    /// Whether a channel is inside the scope
    #[must_use]
    pub fn contains(&self, channel_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Channels(ids) => ids.contains(channel_id),
        }
    }

    /// Intersect with an explicit channel set
    #[must_use]
    pub fn restrict(self, allowed: &BTreeSet<ChannelId>) -> Self {
        match self {
            Self::All => Self::Channels(allowed.clone()),
            Self::Channels(ids) => Self::Channels(ids.intersection(allowed).cloned().collect()),
        }
    }
}

/// Candidate user set for autocomplete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserScope {
    /// No user restriction
    All,
    /// Only these users are visible
    Users(BTreeSet<UserId>),
}

impl UserScope {
    /// Whether a user is inside the scope
    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Users(ids) => ids.contains(user_id),
        }
    }

    fn restrict(self, allowed: &BTreeSet<UserId>) -> Self {
        match self {
            Self::All => Self::Users(allowed.clone()),
            Self::Users(ids) => Self::Users(ids.intersection(allowed).cloned().collect()),
        }
    }
}

/// Resolve the channels a user's post search may read.
///
/// Starts from the user's channel memberships in the team (direct and group
/// conversations included), intersects with any view restrictions, and drops
/// archived channels unless `include_deleted`. Restriction teams keep
/// team-less direct/group conversations visible; they only cut team channels.
pub fn scope_channels(
    store: &dyn ContentStore,
    user_id: &str,
    team_id: &str,
    restrictions: Option<&ViewRestrictions>,
    include_deleted: bool,
) -> StoreResult<BTreeSet<ChannelId>> {
    let membership = store.user_channel_ids(user_id, team_id)?;

    let mut restricted_to = ChannelScope::All;
    if let Some(channels) = restrictions.and_then(|r| r.channels.as_ref()) {
        restricted_to = restricted_to.restrict(&channels.iter().cloned().collect());
    }

    let mut scoped = BTreeSet::new();
    for channel_id in membership {
        if !restricted_to.contains(&channel_id) {
            continue;
        }
        let channel = store.get_channel(&channel_id)?;
        if channel.is_deleted() && !include_deleted {
            continue;
        }
        if let Some(teams) = restrictions.and_then(|r| r.teams.as_ref()) {
            let conversational = matches!(channel.kind, ChannelKind::Direct | ChannelKind::Group);
            if !conversational && !teams.contains(&channel.team_id) {
                continue;
            }
        }
        scoped.insert(channel_id);
    }

    debug!(
        user_id,
        team_id,
        channels = scoped.len(),
        restricted = restrictions.is_some(),
        "resolved channel scope"
    );
    Ok(scoped)
}

/// Resolve which users an autocomplete may surface.
///
/// The restriction teams/channels dimensions and the simpler channel
/// allow-list all compose by intersection of their member sets.
pub fn scope_users(
    store: &dyn ContentStore,
    restrictions: Option<&ViewRestrictions>,
    list_of_allowed_channels: Option<&[ChannelId]>,
) -> StoreResult<UserScope> {
    let mut scope = UserScope::All;

    if let Some(rest) = restrictions {
        if let Some(teams) = &rest.teams {
            let mut members = BTreeSet::new();
            for team_id in teams {
                members.extend(store.team_member_ids(team_id)?);
            }
            scope = scope.restrict(&members);
        }
        if let Some(channels) = &rest.channels {
            let mut members = BTreeSet::new();
            for channel_id in channels {
                members.extend(store.channel_member_ids(channel_id)?);
            }
            scope = scope.restrict(&members);
        }
    }

    if let Some(allowed) = list_of_allowed_channels {
        let mut members = BTreeSet::new();
        for channel_id in allowed {
            members.extend(store.channel_member_ids(channel_id)?);
        }
        scope = scope.restrict(&members);
    }

    Ok(scope)
}

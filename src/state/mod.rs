//! Shared bot state.
//!
//! [`BotState`] is built once at startup and shared by every event handler
//! through an `Arc`. It owns the activity registry, the moderation API
//! handle and the small caches the handlers need between events.

mod lifecycle;

pub use lifecycle::LifecycleManager;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use floodgate_proto::Snowflake;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::api::ModerationApi;
use crate::config::ModerationConfig;
use crate::error::ApiError;
use crate::security::{ActivityRegistry, JoinHeuristics};

/// State shared across all event handlers.
pub struct BotState {
    /// REST calls.
    pub api: Arc<dyn ModerationApi>,
    /// Per-channel flood buckets.
    pub registry: Arc<ActivityRegistry>,
    /// Join-time raid rules.
    pub heuristics: JoinHeuristics,
    /// Moderation settings.
    pub moderation: ModerationConfig,
    /// Guild id -> `@everyone` role id.
    everyone_roles: DashMap<Snowflake, Snowflake>,
    /// Channel id -> time of the last lockdown request.
    lockdowns: DashMap<Snowflake, Instant>,
    /// The bot's own user id, known after READY.
    bot_user: RwLock<Option<Snowflake>>,
}

impl BotState {
    pub fn new(
        api: Arc<dyn ModerationApi>,
        registry: Arc<ActivityRegistry>,
        moderation: ModerationConfig,
    ) -> Self {
        Self {
            api,
            registry,
            heuristics: JoinHeuristics::new(&moderation),
            moderation,
            everyone_roles: DashMap::new(),
            lockdowns: DashMap::new(),
            bot_user: RwLock::new(None),
        }
    }

    /// Record the bot's own identity from READY.
    pub fn set_bot_user(&self, id: Snowflake) {
        *self.bot_user.write() = Some(id);
    }

    pub fn bot_user(&self) -> Option<Snowflake> {
        *self.bot_user.read()
    }

    /// Was this message written by the bot itself?
    pub fn is_self(&self, author: Snowflake) -> bool {
        self.bot_user() == Some(author)
    }

    /// Resolve a guild's `@everyone` role, asking the API once per guild.
    ///
    /// Falls back to the guild id, which is what Discord uses for that role,
    /// when the role list does not name it.
    pub async fn everyone_role(&self, guild_id: Snowflake) -> Result<Snowflake, ApiError> {
        if let Some(id) = self.everyone_roles.get(&guild_id) {
            return Ok(*id);
        }

        let roles = self.api.guild_roles(guild_id).await?;
        let role_id = roles
            .iter()
            .find(|r| r.is_everyone())
            .map(|r| r.id)
            .unwrap_or(guild_id);
        self.everyone_roles.insert(guild_id, role_id);
        Ok(role_id)
    }

    /// Claim the right to lock `channel_id` down at `now`.
    ///
    /// Returns `false` while a previous lockdown of the same channel is
    /// within the cooldown.
    pub fn begin_lockdown(&self, channel_id: Snowflake, now: Instant) -> bool {
        let cooldown = self.moderation.lockdown_cooldown();
        match self.lockdowns.entry(channel_id) {
            Entry::Occupied(mut e) => {
                if now.saturating_duration_since(*e.get()) < cooldown {
                    return false;
                }
                e.insert(now);
                true
            }
            Entry::Vacant(e) => {
                e.insert(now);
                true
            }
        }
    }

    /// Give back a claim from [`begin_lockdown`](Self::begin_lockdown) whose
    /// request failed, so the next denied message tries again.
    pub fn release_lockdown(&self, channel_id: Snowflake) {
        self.lockdowns.remove(&channel_id);
    }

    /// Forget lockdown timestamps older than `max_age`. Returns how many
    /// were removed.
    pub fn prune_lockdowns(&self, max_age: Duration, now: Instant) -> usize {
        let before = self.lockdowns.len();
        self.lockdowns
            .retain(|_, at| now.saturating_duration_since(*at) < max_age);
        before.saturating_sub(self.lockdowns.len())
    }
}

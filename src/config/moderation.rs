//! Moderation behavior: commands, lockdowns and join heuristics.

use floodgate_proto::Snowflake;
use serde::Deserialize;
use std::time::Duration;

use super::types::default_true;

/// Moderation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModerationConfig {
    /// Prefix for chat commands (default: "h!").
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Deny `@everyone` posting when a channel exceeds its rate (default: true).
    #[serde(default = "default_true")]
    pub lockdown_enabled: bool,
    /// Minimum seconds between two lockdown requests for one channel
    /// (default: 30). Keeps a flood from turning into an API flood.
    #[serde(default = "default_lockdown_cooldown_secs")]
    pub lockdown_cooldown_secs: u64,
    /// Kick joining members whose username starts with this (default: "Raid").
    /// Empty disables the check.
    #[serde(default = "default_raid_username_prefix")]
    pub raid_username_prefix: String,
    /// Kick joining members whose account is younger than this many hours
    /// (default: 72). Zero disables the check.
    #[serde(default = "default_min_account_age_hours")]
    pub min_account_age_hours: u64,
    /// Days of message history removed when banning (default: 7, max 7).
    #[serde(default = "default_ban_delete_message_days")]
    pub ban_delete_message_days: u8,
    /// Roles allowed to run `ban`. Empty allows everyone, matching the
    /// bot's historical behavior; the API still enforces the bot's own
    /// permissions.
    #[serde(default)]
    pub ban_roles: Vec<Snowflake>,
}

impl ModerationConfig {
    pub fn lockdown_cooldown(&self) -> Duration {
        Duration::from_secs(self.lockdown_cooldown_secs)
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            lockdown_enabled: true,
            lockdown_cooldown_secs: default_lockdown_cooldown_secs(),
            raid_username_prefix: default_raid_username_prefix(),
            min_account_age_hours: default_min_account_age_hours(),
            ban_delete_message_days: default_ban_delete_message_days(),
            ban_roles: Vec::new(),
        }
    }
}

fn default_command_prefix() -> String {
    "h!".to_string()
}

fn default_lockdown_cooldown_secs() -> u64 {
    30
}

fn default_raid_username_prefix() -> String {
    "Raid".to_string()
}

fn default_min_account_age_hours() -> u64 {
    72
}

fn default_ban_delete_message_days() -> u8 {
    7
}

//! Integration test common infrastructure.
//!
//! Provides a recording [`ModerationApi`] fake and helpers for building bot
//! state and gateway events around it.

pub mod api;

#[allow(unused_imports)]
pub use api::{ApiCall, MockApi};

use floodgate::config::{LimitsConfig, ModerationConfig};
use floodgate::security::ActivityRegistry;
use floodgate::state::BotState;
use floodgate_proto::{Message, MessageMember, Snowflake, User, DISCORD_EPOCH_MS};
use std::sync::Arc;

pub const GUILD: Snowflake = Snowflake(1000);
pub const CHANNEL: Snowflake = Snowflake(2000);
pub const BOT: Snowflake = Snowflake(3000);

/// Bot state over a fresh mock and default limits.
#[allow(dead_code)]
pub fn bot_state(api: Arc<MockApi>, moderation: ModerationConfig) -> Arc<BotState> {
    let registry = Arc::new(ActivityRegistry::new(&LimitsConfig::default()));
    Arc::new(BotState::new(api, registry, moderation))
}

/// A user id whose embedded creation time is `age` before now.
#[allow(dead_code)]
pub fn user_aged(username: &str, age: chrono::Duration) -> User {
    let created = chrono::Utc::now() - age;
    let ms = created.timestamp_millis() as u64 - DISCORD_EPOCH_MS;
    User {
        id: Snowflake(ms << 22),
        username: username.to_string(),
        bot: false,
    }
}

/// A guild message in [`CHANNEL`].
#[allow(dead_code)]
pub fn guild_message(author: Snowflake, content: &str) -> Message {
    Message {
        id: Snowflake(1),
        channel_id: CHANNEL,
        guild_id: Some(GUILD),
        author: User {
            id: author,
            username: format!("user{author}"),
            bot: false,
        },
        content: content.to_string(),
        member: Some(MessageMember::default()),
    }
}

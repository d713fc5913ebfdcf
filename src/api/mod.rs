//! Moderation API abstraction.
//!
//! Handlers talk to Discord only through [`ModerationApi`], so tests can
//! swap the REST client for a recording fake.

use async_trait::async_trait;
use floodgate_proto::{GuildMember, Role, Snowflake};

use crate::error::ApiError;

pub mod rest;
pub mod retry;

pub use rest::RestClient;
pub use retry::{RetryPolicy, with_bad_gateway_retry};

/// Most members one page of the member listing returns.
pub const MEMBER_PAGE_LIMIT: u16 = 1000;

/// The REST calls floodgate issues.
#[async_trait]
pub trait ModerationApi: Send + Sync {
    /// Every role of a guild.
    async fn guild_roles(&self, guild_id: Snowflake) -> Result<Vec<Role>, ApiError>;

    /// Set a role overwrite on a channel that denies `deny` and allows nothing.
    async fn deny_channel_permission(
        &self,
        channel_id: Snowflake,
        role_id: Snowflake,
        deny: u64,
    ) -> Result<(), ApiError>;

    /// Post a plain text message.
    async fn send_message(&self, channel_id: Snowflake, content: &str) -> Result<(), ApiError>;

    /// One page of guild members with ids greater than `after`.
    async fn guild_members(
        &self,
        guild_id: Snowflake,
        after: Snowflake,
        limit: u16,
    ) -> Result<Vec<GuildMember>, ApiError>;

    /// Ban a user, removing `delete_message_days` of their history.
    async fn ban_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        delete_message_days: u8,
    ) -> Result<(), ApiError>;

    /// Remove a member with an audit log reason.
    async fn kick_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        reason: &str,
    ) -> Result<(), ApiError>;
}

/// Fetch every member of a guild, following pagination until a short page.
pub async fn all_guild_members(
    api: &dyn ModerationApi,
    guild_id: Snowflake,
) -> Result<Vec<GuildMember>, ApiError> {
    let mut members = Vec::new();
    let mut after = Snowflake(0);

    loop {
        let page = api.guild_members(guild_id, after, MEMBER_PAGE_LIMIT).await?;
        let full = page.len() >= usize::from(MEMBER_PAGE_LIMIT);
        let last = page.last().map(|m| m.user.id);
        members.extend(page);

        match last {
            Some(id) if full => after = id,
            _ => break,
        }
    }

    Ok(members)
}

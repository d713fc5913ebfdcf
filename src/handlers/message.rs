//! `MESSAGE_CREATE` handling: flood lockdown, then commands.

use floodgate_proto::{Message, Snowflake, permissions};
use tokio::time::Instant;

use super::Context;
use super::commands::{self, Command};
use crate::error::{ApiError, HandlerResult};

/// Handle a new message.
///
/// Every guild message spends a token from its channel's bucket, including
/// the bot's own replies. When the bucket is empty the channel is locked
/// for `@everyone`. Commands run afterwards, whatever the bucket said.
pub async fn handle_message(ctx: &Context, msg: &Message) -> HandlerResult {
    crate::metrics::record_message();

    if let Some(guild_id) = msg.guild_id {
        let allowed = ctx.state.registry.allow(&msg.channel_id.to_string())?;
        if !allowed {
            crate::metrics::record_rate_limited();
            lockdown(ctx, guild_id, msg.channel_id).await;
        }
    }

    if ctx.state.is_self(msg.author.id) {
        return Ok(());
    }

    match Command::parse(&ctx.state.moderation.command_prefix, &msg.content) {
        Some(command) => commands::execute(ctx, msg, command).await,
        None => Ok(()),
    }
}

/// Deny `@everyone` posting in the channel.
///
/// Failures are logged and do not stop command processing. A failed
/// request releases the cooldown so the flood keeps retrying.
async fn lockdown(ctx: &Context, guild_id: Snowflake, channel_id: Snowflake) {
    let state = &ctx.state;
    if !state.moderation.lockdown_enabled {
        tracing::debug!(%channel_id, "Channel over rate, lockdown disabled");
        return;
    }
    if !state.begin_lockdown(channel_id, Instant::now()) {
        tracing::debug!(%channel_id, "Channel over rate, lockdown already requested");
        return;
    }

    let result: Result<(), ApiError> = async {
        let everyone = state.everyone_role(guild_id).await?;
        state
            .api
            .deny_channel_permission(channel_id, everyone, permissions::SEND_MESSAGES)
            .await
    }
    .await;

    match result {
        Ok(()) => {
            crate::metrics::record_lockdown();
            tracing::warn!(%guild_id, %channel_id, "Channel locked down after message flood");
        }
        Err(e) => {
            state.release_lockdown(channel_id);
            tracing::error!(%guild_id, %channel_id, code = e.error_code(), error = %e, "Channel lockdown failed");
        }
    }
}

//! Chat commands: `ping`, `find` and `ban`.
//!
//! Parsing is pure; [`execute`] performs the REST calls and replies.

use floodgate_proto::{Message, Snowflake};

use super::Context;
use crate::api::all_guild_members;
use crate::error::HandlerResult;

/// Longest message content Discord accepts.
pub const MAX_MESSAGE_LEN: usize = 2000;

pub const NOT_FOUND_REPLY: &str = "Couldn't find anyone with this username.";
pub const FIND_USAGE: &str = "Usage: find <username prefix>";
pub const BAN_USAGE: &str = "Usage: ban <user id>, <user id>, ...";
pub const BAN_DENIED_REPLY: &str = "You are not allowed to use this command.";
pub const GUILD_ONLY_REPLY: &str = "This command only works in a server.";

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Liveness check.
    Ping,
    /// List ids of members whose username starts with the argument.
    Find(String),
    /// Ban each listed user.
    Ban(Vec<String>),
}

impl Command {
    /// Parse `content` as a command under `prefix`.
    ///
    /// Returns `None` for anything that is not a known command. The command
    /// word must be followed by whitespace or the end of the message.
    pub fn parse(prefix: &str, content: &str) -> Option<Self> {
        let rest = content.strip_prefix(prefix)?;
        let (name, args) = match rest.find(char::is_whitespace) {
            Some(idx) => (&rest[..idx], rest[idx..].trim()),
            None => (rest, ""),
        };

        match name {
            "ping" if args.is_empty() => Some(Self::Ping),
            "find" => Some(Self::Find(args.to_string())),
            "ban" => Some(Self::Ban(
                args.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            _ => None,
        }
    }

    /// Static name for metrics and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Find(_) => "find",
            Self::Ban(_) => "ban",
        }
    }
}

/// Run a parsed command in reply to `msg`.
pub async fn execute(ctx: &Context, msg: &Message, command: Command) -> HandlerResult {
    crate::metrics::record_command(command.name());
    tracing::debug!(command = command.name(), channel = %msg.channel_id, author = %msg.author.id, "Executing command");

    match command {
        Command::Ping => reply(ctx, msg, "Pong!").await,
        Command::Find(prefix) => find(ctx, msg, &prefix).await,
        Command::Ban(targets) => ban(ctx, msg, &targets).await,
    }
}

async fn find(ctx: &Context, msg: &Message, prefix: &str) -> HandlerResult {
    let Some(guild_id) = msg.guild_id else {
        return reply(ctx, msg, GUILD_ONLY_REPLY).await;
    };
    if prefix.is_empty() {
        return reply(ctx, msg, FIND_USAGE).await;
    }

    let members = all_guild_members(ctx.state.api.as_ref(), guild_id).await?;
    let ids: Vec<String> = members
        .iter()
        .filter(|m| m.user.username.starts_with(prefix))
        .map(|m| m.user.id.to_string())
        .collect();

    tracing::info!(%guild_id, prefix, scanned = members.len(), found = ids.len(), "Member search");

    if ids.is_empty() {
        return reply(ctx, msg, NOT_FOUND_REPLY).await;
    }

    let text = format!(
        "There are IDs of people starting with: {prefix} and here is the array: {}",
        ids.join(", ")
    );
    for chunk in split_message(&text, MAX_MESSAGE_LEN) {
        reply(ctx, msg, chunk).await?;
    }
    Ok(())
}

async fn ban(ctx: &Context, msg: &Message, targets: &[String]) -> HandlerResult {
    let Some(guild_id) = msg.guild_id else {
        return reply(ctx, msg, GUILD_ONLY_REPLY).await;
    };
    if !may_ban(&ctx.state.moderation.ban_roles, msg) {
        tracing::warn!(author = %msg.author.id, %guild_id, "Ban refused, author lacks a ban role");
        return reply(ctx, msg, BAN_DENIED_REPLY).await;
    }
    if targets.is_empty() {
        return reply(ctx, msg, BAN_USAGE).await;
    }

    let days = ctx.state.moderation.ban_delete_message_days;
    for target in targets {
        let banned = match parse_user_ref(target) {
            Some(user_id) => match ctx.state.api.ban_member(guild_id, user_id, days).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(%guild_id, target = %target, error = %e, "Ban failed");
                    false
                }
            },
            None => {
                tracing::warn!(target = %target, "Ban target is not a user id");
                false
            }
        };

        if !banned {
            return reply(ctx, msg, &format!("Failed to ban {target}")).await;
        }

        crate::metrics::record_ban();
        tracing::info!(%guild_id, user = %target, by = %msg.author.id, "Member banned");
        reply(ctx, msg, &format!("Banned {target}")).await?;
    }
    Ok(())
}

/// Is the author allowed to ban? An empty role list allows everyone.
fn may_ban(ban_roles: &[Snowflake], msg: &Message) -> bool {
    if ban_roles.is_empty() {
        return true;
    }
    msg.member
        .as_ref()
        .is_some_and(|m| m.roles.iter().any(|r| ban_roles.contains(r)))
}

/// Accept a bare id or a user mention (`<@id>` / `<@!id>`).
pub fn parse_user_ref(target: &str) -> Option<Snowflake> {
    let id = target
        .strip_prefix("<@")
        .and_then(|s| s.strip_suffix('>'))
        .map(|s| s.trim_start_matches('!'))
        .unwrap_or(target);
    id.parse().ok()
}

async fn reply(ctx: &Context, msg: &Message, content: &str) -> HandlerResult {
    ctx.state.api.send_message(msg.channel_id, content).await?;
    Ok(())
}

/// Split `text` into pieces of at most `max` bytes, preferring to break
/// after a `", "` separator and never inside a UTF-8 sequence.
pub fn split_message(text: &str, max: usize) -> Vec<&str> {
    let max = max.max(4);
    let mut parts = Vec::new();
    let mut rest = text;

    while rest.len() > max {
        let mut cut = max;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if let Some(sep) = rest[..cut].rfind(", ") {
            if sep > 0 {
                cut = sep + 2;
            }
        }
        let (head, tail) = rest.split_at(cut);
        parts.push(head);
        rest = tail;
    }

    if !rest.is_empty() {
        parts.push(rest);
    }
    parts
}

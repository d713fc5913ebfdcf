//! REST / dispatch object types.
//!
//! Only the fields floodgate reads are modelled; unknown fields are ignored
//! by serde so newer API versions keep decoding.

use serde::{Deserialize, Serialize};

use crate::snowflake::Snowflake;

/// A Discord user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id; also encodes the account creation time.
    pub id: Snowflake,
    /// Account username (not the per-guild nickname).
    pub username: String,
    /// Whether the account is a bot.
    #[serde(default)]
    pub bot: bool,
}

/// A user's membership in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildMember {
    /// The member's user account.
    pub user: User,
    /// Guild-specific nickname.
    #[serde(default)]
    pub nick: Option<String>,
    /// Role ids assigned to the member.
    #[serde(default)]
    pub roles: Vec<Snowflake>,
}

/// A guild role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role id. For `@everyone` this equals the guild id.
    pub id: Snowflake,
    /// Display name.
    pub name: String,
    /// Permission bit set as a decimal string.
    #[serde(default)]
    pub permissions: String,
}

impl Role {
    /// Name of the implicit role every guild member holds.
    pub const EVERYONE: &'static str = "@everyone";

    /// Is this the guild's `@everyone` role?
    pub fn is_everyone(&self) -> bool {
        self.name == Self::EVERYONE
    }
}

/// A message posted in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message id.
    pub id: Snowflake,
    /// Channel the message was posted in.
    pub channel_id: Snowflake,
    /// Guild of the channel; absent for direct messages.
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    /// Author account.
    pub author: User,
    /// Text content (empty without the MESSAGE_CONTENT intent).
    #[serde(default)]
    pub content: String,
    /// Author's guild membership; absent for direct messages.
    #[serde(default)]
    pub member: Option<MessageMember>,
}

/// Partial member attached to guild messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMember {
    /// Role ids held by the author.
    #[serde(default)]
    pub roles: Vec<Snowflake>,
}

/// `GUILD_MEMBER_ADD` dispatch body: a member plus the guild it joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAdd {
    /// Guild the member joined.
    pub guild_id: Snowflake,
    /// The new member.
    #[serde(flatten)]
    pub member: GuildMember,
}

/// `READY` dispatch body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ready {
    /// The bot's own user account.
    pub user: User,
    /// Gateway session id.
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_add_flattens_member() {
        let raw = r#"{
            "guild_id": "100",
            "user": {"id": "200", "username": "RaidBoss"},
            "roles": [],
            "joined_at": "2024-01-01T00:00:00+00:00"
        }"#;
        let evt: MemberAdd = serde_json::from_str(raw).unwrap();
        assert_eq!(evt.guild_id, Snowflake(100));
        assert_eq!(evt.member.user.username, "RaidBoss");
        assert!(!evt.member.user.bot);
    }

    #[test]
    fn test_message_without_guild() {
        let raw = r#"{"id":"1","channel_id":"2","author":{"id":"3","username":"dm"}}"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        assert!(msg.guild_id.is_none());
        assert!(msg.content.is_empty());
        assert!(msg.member.is_none());
    }

    #[test]
    fn test_everyone_role() {
        let role = Role {
            id: Snowflake(1),
            name: "@everyone".into(),
            permissions: "0".into(),
        };
        assert!(role.is_everyone());
    }
}

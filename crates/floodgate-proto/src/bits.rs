//! Bit flag constants for gateway intents and channel permissions.

/// Gateway intents requested at identify time.
pub mod intents {
    /// Guild create/update/delete and role events.
    pub const GUILDS: u64 = 1 << 0;
    /// Member add/update/remove events (privileged).
    pub const GUILD_MEMBERS: u64 = 1 << 1;
    /// Message create/update/delete in guild channels.
    pub const GUILD_MESSAGES: u64 = 1 << 9;
    /// Access to message content (privileged).
    pub const MESSAGE_CONTENT: u64 = 1 << 15;

    /// Everything the moderation bot listens to.
    pub const MODERATION: u64 = GUILDS | GUILD_MEMBERS | GUILD_MESSAGES | MESSAGE_CONTENT;
}

/// Channel permission bits used in overwrites.
pub mod permissions {
    /// Permission to post messages in a text channel.
    pub const SEND_MESSAGES: u64 = 1 << 11;
}

//! Event handling end to end against a recording API.

mod common;

use common::{ApiCall, BOT, CHANNEL, GUILD, MockApi, bot_state, guild_message, user_aged};
use floodgate::config::ModerationConfig;
use floodgate::handlers::Dispatcher;
use floodgate_proto::{
    Event, GuildMember, MemberAdd, MessageMember, Ready, Role, Snowflake, User, permissions,
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

const EVERYONE: Snowflake = Snowflake(4000);
const MOD_ROLE: Snowflake = Snowflake(4001);

fn api_with_roles() -> MockApi {
    MockApi {
        roles: vec![
            Role {
                id: MOD_ROLE,
                name: "mods".into(),
                permissions: "0".into(),
            },
            Role {
                id: EVERYONE,
                name: "@everyone".into(),
                permissions: "0".into(),
            },
        ],
        ..MockApi::default()
    }
}

fn member(id: u64, username: &str) -> GuildMember {
    GuildMember {
        user: User {
            id: Snowflake(id),
            username: username.to_string(),
            bot: false,
        },
        nick: None,
        roles: vec![],
    }
}

fn dispatcher(api: &Arc<MockApi>, moderation: ModerationConfig) -> Dispatcher {
    Dispatcher::new(bot_state(Arc::clone(api), moderation))
}

async fn ready(dispatcher: &Dispatcher) {
    dispatcher
        .handle(Event::Ready(Ready {
            user: User {
                id: BOT,
                username: "floodgate".into(),
                bot: true,
            },
            session_id: "s".into(),
        }))
        .await;
}

async fn say(dispatcher: &Dispatcher, author: u64, content: &str) {
    dispatcher
        .handle(Event::MessageCreate(guild_message(Snowflake(author), content)))
        .await;
}

// ============================================================================
// Flood lockdown
// ============================================================================

#[tokio::test]
async fn test_flood_locks_channel_once() {
    let api = Arc::new(api_with_roles());
    let dispatcher = dispatcher(&api, ModerationConfig::default());

    for _ in 0..45 {
        say(&dispatcher, 7, "spam").await;
    }

    let lockdowns = api.count(|c| matches!(c, ApiCall::DenyPermission { .. }));
    assert_eq!(lockdowns, 1, "cooldown keeps repeated floods to one request");
    assert!(api.calls().contains(&ApiCall::DenyPermission {
        channel: CHANNEL,
        role: EVERYONE,
        deny: permissions::SEND_MESSAGES,
    }));
    assert_eq!(api.count(|c| matches!(c, ApiCall::GuildRoles(_))), 1);
}

#[tokio::test]
async fn test_failed_lockdown_retried_on_next_flood_message() {
    let api = Arc::new(MockApi {
        deny_failures: AtomicUsize::new(1),
        ..api_with_roles()
    });
    let dispatcher = dispatcher(&api, ModerationConfig::default());

    let lockdowns = || api.count(|c| matches!(c, ApiCall::DenyPermission { .. }));
    for _ in 0..200 {
        say(&dispatcher, 7, "spam").await;
        if lockdowns() == 2 {
            break;
        }
    }

    assert_eq!(lockdowns(), 2, "failed lockdown must not hold the cooldown");
}

#[tokio::test]
async fn test_quiet_channel_not_locked() {
    let api = Arc::new(api_with_roles());
    let dispatcher = dispatcher(&api, ModerationConfig::default());

    for _ in 0..10 {
        say(&dispatcher, 7, "hello").await;
    }
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_lockdown_disabled() {
    let api = Arc::new(api_with_roles());
    let moderation = ModerationConfig {
        lockdown_enabled: false,
        ..ModerationConfig::default()
    };
    let dispatcher = dispatcher(&api, moderation);

    for _ in 0..60 {
        say(&dispatcher, 7, "spam").await;
    }
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_direct_messages_not_rate_limited() {
    let api = Arc::new(api_with_roles());
    let dispatcher = dispatcher(&api, ModerationConfig::default());

    for _ in 0..60 {
        let mut msg = guild_message(Snowflake(7), "dm");
        msg.guild_id = None;
        msg.member = None;
        dispatcher.handle(Event::MessageCreate(msg)).await;
    }
    assert!(api.calls().is_empty());
}

// ============================================================================
// Commands
// ============================================================================

#[tokio::test]
async fn test_ping() {
    let api = Arc::new(api_with_roles());
    let dispatcher = dispatcher(&api, ModerationConfig::default());

    say(&dispatcher, 7, "h!ping").await;
    assert_eq!(
        api.calls(),
        vec![ApiCall::SendMessage {
            channel: CHANNEL,
            content: "Pong!".into(),
        }]
    );
}

#[tokio::test]
async fn test_own_messages_ignored() {
    let api = Arc::new(api_with_roles());
    let dispatcher = dispatcher(&api, ModerationConfig::default());
    ready(&dispatcher).await;

    say(&dispatcher, BOT.get(), "h!ping").await;
    assert!(api.sent().is_empty());
}

#[tokio::test]
async fn test_custom_prefix() {
    let api = Arc::new(api_with_roles());
    let moderation = ModerationConfig {
        command_prefix: "!".into(),
        ..ModerationConfig::default()
    };
    let dispatcher = dispatcher(&api, moderation);

    say(&dispatcher, 7, "h!ping").await;
    say(&dispatcher, 7, "!ping").await;
    assert_eq!(api.sent(), vec!["Pong!".to_string()]);
}

#[tokio::test]
async fn test_find_pages_through_members() {
    let mut api = api_with_roles();
    api.members = (1..=2500)
        .map(|i| member(i, if i % 1000 == 0 { "Raider" } else { "alice" }))
        .collect();
    let api = Arc::new(api);
    let dispatcher = dispatcher(&api, ModerationConfig::default());

    say(&dispatcher, 7, "h!find Raid").await;

    let pages: Vec<_> = api
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            ApiCall::GuildMembers { after, limit, .. } => Some((after, limit)),
            _ => None,
        })
        .collect();
    assert_eq!(
        pages,
        vec![
            (Snowflake(0), 1000),
            (Snowflake(1000), 1000),
            (Snowflake(2000), 1000),
        ]
    );
    assert_eq!(
        api.sent(),
        vec!["There are IDs of people starting with: Raid and here is the array: 1000, 2000".to_string()]
    );
}

#[tokio::test]
async fn test_find_nobody() {
    let mut api = api_with_roles();
    api.members = vec![member(1, "alice")];
    let api = Arc::new(api);
    let dispatcher = dispatcher(&api, ModerationConfig::default());

    say(&dispatcher, 7, "h!find zed").await;
    assert_eq!(
        api.sent(),
        vec!["Couldn't find anyone with this username.".to_string()]
    );
}

#[tokio::test]
async fn test_find_long_reply_is_split() {
    let mut api = api_with_roles();
    api.members = (1..=400).map(|i| member(1_000_000_000_000 + i, "raider")).collect();
    let api = Arc::new(api);
    let dispatcher = dispatcher(&api, ModerationConfig::default());

    say(&dispatcher, 7, "h!find raid").await;

    let sent = api.sent();
    assert!(sent.len() > 1);
    assert!(sent.iter().all(|m| m.len() <= floodgate::handlers::MAX_MESSAGE_LEN));
}

#[tokio::test]
async fn test_ban_list_stops_at_first_failure() {
    let mut api = api_with_roles();
    api.unbannable.insert(Snowflake(22));
    let api = Arc::new(api);
    let dispatcher = dispatcher(&api, ModerationConfig::default());

    say(&dispatcher, 7, "h!ban 11, 22, 33").await;

    let bans: Vec<_> = api
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            ApiCall::Ban {
                user,
                delete_message_days,
                ..
            } => Some((user, delete_message_days)),
            _ => None,
        })
        .collect();
    assert_eq!(bans, vec![(Snowflake(11), 7), (Snowflake(22), 7)]);
    assert_eq!(
        api.sent(),
        vec!["Banned 11".to_string(), "Failed to ban 22".to_string()]
    );
}

#[tokio::test]
async fn test_ban_invalid_target() {
    let api = Arc::new(api_with_roles());
    let dispatcher = dispatcher(&api, ModerationConfig::default());

    say(&dispatcher, 7, "h!ban bob").await;
    assert_eq!(api.count(|c| matches!(c, ApiCall::Ban { .. })), 0);
    assert_eq!(api.sent(), vec!["Failed to ban bob".to_string()]);
}

#[tokio::test]
async fn test_ban_requires_configured_role() {
    let api = Arc::new(api_with_roles());
    let moderation = ModerationConfig {
        ban_roles: vec![MOD_ROLE],
        ..ModerationConfig::default()
    };
    let dispatcher = dispatcher(&api, moderation);

    say(&dispatcher, 7, "h!ban 11").await;
    assert_eq!(api.count(|c| matches!(c, ApiCall::Ban { .. })), 0);

    let mut msg = guild_message(Snowflake(8), "h!ban 11");
    msg.member = Some(MessageMember {
        roles: vec![MOD_ROLE],
    });
    dispatcher.handle(Event::MessageCreate(msg)).await;
    assert_eq!(api.count(|c| matches!(c, ApiCall::Ban { .. })), 1);
}

// ============================================================================
// Member join
// ============================================================================

async fn join(dispatcher: &Dispatcher, user: User) {
    dispatcher
        .handle(Event::MemberAdd(MemberAdd {
            guild_id: GUILD,
            member: GuildMember {
                user,
                nick: None,
                roles: vec![],
            },
        }))
        .await;
}

fn kicks(api: &MockApi) -> Vec<String> {
    api.calls()
        .into_iter()
        .filter_map(|c| match c {
            ApiCall::Kick { reason, .. } => Some(reason),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_raid_username_kicked() {
    let api = Arc::new(MockApi::default());
    let dispatcher = dispatcher(&api, ModerationConfig::default());

    join(&dispatcher, user_aged("RaidLeader", chrono::Duration::days(365))).await;
    assert_eq!(kicks(&api), vec!["Username starts with 'Raid'.".to_string()]);
}

#[tokio::test]
async fn test_young_account_kicked() {
    let api = Arc::new(MockApi::default());
    let dispatcher = dispatcher(&api, ModerationConfig::default());

    join(&dispatcher, user_aged("newbie", chrono::Duration::hours(2))).await;
    assert_eq!(
        kicks(&api),
        vec!["Account created less than 72 hours ago.".to_string()]
    );
}

#[tokio::test]
async fn test_member_kicked_at_most_once() {
    let api = Arc::new(MockApi::default());
    let dispatcher = dispatcher(&api, ModerationConfig::default());

    join(&dispatcher, user_aged("RaidBot", chrono::Duration::hours(2))).await;
    assert_eq!(kicks(&api), vec!["Username starts with 'Raid'.".to_string()]);
}

#[tokio::test]
async fn test_failed_kick_not_retried_with_next_rule() {
    let api = Arc::new(MockApi {
        fail_kicks: true,
        ..MockApi::default()
    });
    let dispatcher = dispatcher(&api, ModerationConfig::default());

    join(&dispatcher, user_aged("RaidBot", chrono::Duration::hours(2))).await;
    assert_eq!(kicks(&api).len(), 1);
}

#[tokio::test]
async fn test_established_member_admitted() {
    let api = Arc::new(MockApi::default());
    let dispatcher = dispatcher(&api, ModerationConfig::default());

    join(&dispatcher, user_aged("alice", chrono::Duration::days(30))).await;
    assert!(api.calls().is_empty());
}

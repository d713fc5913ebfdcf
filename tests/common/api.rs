//! Recording fake of the moderation API.

use async_trait::async_trait;
use floodgate::api::ModerationApi;
use floodgate::error::ApiError;
use floodgate_proto::{GuildMember, Role, Snowflake};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One call observed by [`MockApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    GuildRoles(Snowflake),
    DenyPermission {
        channel: Snowflake,
        role: Snowflake,
        deny: u64,
    },
    SendMessage {
        channel: Snowflake,
        content: String,
    },
    GuildMembers {
        guild: Snowflake,
        after: Snowflake,
        limit: u16,
    },
    Ban {
        guild: Snowflake,
        user: Snowflake,
        delete_message_days: u8,
    },
    Kick {
        guild: Snowflake,
        user: Snowflake,
        reason: String,
    },
}

/// Records every call and answers from canned data.
#[derive(Default)]
pub struct MockApi {
    pub roles: Vec<Role>,
    /// Full member list; served in pages like the real endpoint.
    pub members: Vec<GuildMember>,
    /// Users whose ban fails with 403.
    pub unbannable: HashSet<Snowflake>,
    /// Make every kick fail with 403.
    pub fail_kicks: bool,
    /// Number of permission overwrites that fail with 502 before one succeeds.
    pub deny_failures: AtomicUsize,
    pub calls: Mutex<Vec<ApiCall>>,
}

#[allow(dead_code)]
impl MockApi {
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().clone()
    }

    /// Content of every sent message, in order.
    pub fn sent(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                ApiCall::SendMessage { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().push(call);
    }
}

fn forbidden() -> ApiError {
    ApiError::Status {
        status: 403,
        body: r#"{"message": "Missing Permissions", "code": 50013}"#.into(),
    }
}

#[async_trait]
impl ModerationApi for MockApi {
    async fn guild_roles(&self, guild_id: Snowflake) -> Result<Vec<Role>, ApiError> {
        self.record(ApiCall::GuildRoles(guild_id));
        Ok(self.roles.clone())
    }

    async fn deny_channel_permission(
        &self,
        channel_id: Snowflake,
        role_id: Snowflake,
        deny: u64,
    ) -> Result<(), ApiError> {
        self.record(ApiCall::DenyPermission {
            channel: channel_id,
            role: role_id,
            deny,
        });
        let failing = self
            .deny_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ApiError::Status {
                status: 502,
                body: "Bad Gateway".into(),
            });
        }
        Ok(())
    }

    async fn send_message(&self, channel_id: Snowflake, content: &str) -> Result<(), ApiError> {
        self.record(ApiCall::SendMessage {
            channel: channel_id,
            content: content.to_string(),
        });
        Ok(())
    }

    async fn guild_members(
        &self,
        guild_id: Snowflake,
        after: Snowflake,
        limit: u16,
    ) -> Result<Vec<GuildMember>, ApiError> {
        self.record(ApiCall::GuildMembers {
            guild: guild_id,
            after,
            limit,
        });
        let mut sorted = self.members.clone();
        sorted.sort_by_key(|m| m.user.id);
        Ok(sorted
            .into_iter()
            .filter(|m| m.user.id > after)
            .take(usize::from(limit))
            .collect())
    }

    async fn ban_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        delete_message_days: u8,
    ) -> Result<(), ApiError> {
        self.record(ApiCall::Ban {
            guild: guild_id,
            user: user_id,
            delete_message_days,
        });
        if self.unbannable.contains(&user_id) {
            return Err(forbidden());
        }
        Ok(())
    }

    async fn kick_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        reason: &str,
    ) -> Result<(), ApiError> {
        self.record(ApiCall::Kick {
            guild: guild_id,
            user: user_id,
            reason: reason.to_string(),
        });
        if self.fail_kicks {
            return Err(forbidden());
        }
        Ok(())
    }
}

//! Discord REST client.
//!
//! Thin wrapper over `reqwest` that adds bot authorization, maps non-2xx
//! responses to [`ApiError::Status`] and wraps idempotent calls in the
//! bad-gateway retry.

use async_trait::async_trait;
use floodgate_proto::{GuildMember, Role, Snowflake};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::ModerationApi;
use super::retry::{RetryPolicy, with_bad_gateway_retry};
use crate::config::{ApiConfig, BotToken};
use crate::error::ApiError;

/// Header carrying the audit log entry text.
const AUDIT_LOG_REASON: &str = "X-Audit-Log-Reason";

/// Overwrite target type for roles.
const OVERWRITE_ROLE: u8 = 0;

const SECONDS_PER_DAY: u32 = 86_400;

/// REST client for the moderation calls.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base: String,
    retry: RetryPolicy,
}

impl RestClient {
    /// Build a client for `config.rest_base` authenticated with `token`.
    pub fn new(config: &ApiConfig, token: &BotToken) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bot {}", token.expose()))
            .map_err(|_| ApiError::Unexpected("bot token is not a valid header value".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(
                "DiscordBot (https://github.com/floodgate-bot/floodgate, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            )),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base: config.rest_base.trim_end_matches('/').to_string(),
            retry: RetryPolicy::from(config),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Send a request and fail on any non-2xx status.
    async fn execute(request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn execute_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        Ok(Self::execute(request).await?.json::<T>().await?)
    }
}

#[async_trait]
impl ModerationApi for RestClient {
    async fn guild_roles(&self, guild_id: Snowflake) -> Result<Vec<Role>, ApiError> {
        let url = self.url(&format!("/guilds/{guild_id}/roles"));
        with_bad_gateway_retry(self.retry, "guild_roles", || {
            let request = self.http.get(&url);
            async move { Self::execute_json(request).await }
        })
        .await
    }

    async fn deny_channel_permission(
        &self,
        channel_id: Snowflake,
        role_id: Snowflake,
        deny: u64,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("/channels/{channel_id}/permissions/{role_id}"));
        let body = json!({
            "allow": "0",
            "deny": deny.to_string(),
            "type": OVERWRITE_ROLE,
        });
        with_bad_gateway_retry(self.retry, "deny_channel_permission", || {
            let request = self.http.put(&url).json(&body);
            async move { Self::execute(request).await.map(drop) }
        })
        .await
    }

    async fn send_message(&self, channel_id: Snowflake, content: &str) -> Result<(), ApiError> {
        // Not idempotent: a 502 may still have delivered the message
        let request = self
            .http
            .post(self.url(&format!("/channels/{channel_id}/messages")))
            .json(&json!({ "content": content }));
        Self::execute(request).await.map(drop)
    }

    async fn guild_members(
        &self,
        guild_id: Snowflake,
        after: Snowflake,
        limit: u16,
    ) -> Result<Vec<GuildMember>, ApiError> {
        let url = self.url(&format!("/guilds/{guild_id}/members"));
        let query = [("limit", limit.to_string()), ("after", after.to_string())];
        with_bad_gateway_retry(self.retry, "guild_members", || {
            let request = self.http.get(&url).query(&query);
            async move { Self::execute_json(request).await }
        })
        .await
    }

    async fn ban_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        delete_message_days: u8,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("/guilds/{guild_id}/bans/{user_id}"));
        let body = json!({
            "delete_message_seconds": u32::from(delete_message_days) * SECONDS_PER_DAY,
        });
        with_bad_gateway_retry(self.retry, "ban_member", || {
            let request = self.http.put(&url).json(&body);
            async move { Self::execute(request).await.map(drop) }
        })
        .await
    }

    async fn kick_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        reason: &str,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("/guilds/{guild_id}/members/{user_id}"));
        let reason = match HeaderValue::from_str(reason) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%user_id, "Kick reason is not a valid header value, sending without it");
                None
            }
        };
        with_bad_gateway_retry(self.retry, "kick_member", || {
            let mut request = self.http.delete(&url);
            if let Some(reason) = &reason {
                request = request.header(AUDIT_LOG_REASON, reason.clone());
            }
            async move { Self::execute(request).await.map(drop) }
        })
        .await
    }
}

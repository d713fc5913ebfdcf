//! Core configuration types and loading.

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use super::api::{ApiConfig, MetricsConfig};
use super::limits::LimitsConfig;
use super::moderation::ModerationConfig;

/// Environment variable holding the bot token when no config file exists.
pub const TOKEN_ENV_VAR: &str = "FLOODGATE_BOT_TOKEN";

/// Older variable name, read when [`TOKEN_ENV_VAR`] is unset.
pub const LEGACY_TOKEN_ENV_VAR: &str = "HELPER_BOTTOKEN";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Bot credential, without the `Bot ` scheme prefix.
    #[serde(alias = "botToken")]
    pub bot_token: BotToken,
    /// Channel flood limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Moderation behavior.
    #[serde(default)]
    pub moderation: ModerationConfig,
    /// Discord endpoints and HTTP behavior.
    #[serde(default)]
    pub api: ApiConfig,
    /// Prometheus endpoint.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Build configuration from the process environment.
    ///
    /// Only the token is read; every other setting keeps its default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_ENV_VAR)
            .or_else(|| lookup(LEGACY_TOKEN_ENV_VAR))
            .ok_or(ConfigError::MissingEnv(TOKEN_ENV_VAR))?;
        Ok(Self::with_token(token))
    }

    /// Use the TOML file when it exists, the environment otherwise.
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            tracing::info!(
                path = %path.as_ref().display(),
                "Config file not found, reading {} from the environment",
                TOKEN_ENV_VAR
            );
            Self::from_env()
        }
    }

    /// Default configuration around a token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            bot_token: BotToken(token.into()),
            limits: LimitsConfig::default(),
            moderation: ModerationConfig::default(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Opaque bot credential. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct BotToken(String);

impl BotToken {
    /// The raw token, for the Authorization header and IDENTIFY.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BotToken(<redacted>)")
    }
}

pub(super) fn default_true() -> bool {
    true
}

//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Root config struct, token wrapper and file/env loading
//! - [`limits`]: Per-channel flood limits and sweeper timing (LimitsConfig)
//! - [`moderation`]: Commands, lockdown and join heuristics (ModerationConfig)
//! - [`api`]: Discord endpoints, retry policy and metrics port (ApiConfig, MetricsConfig)
//! - [`validation`]: Startup validation collecting every problem at once

mod api;
mod limits;
mod moderation;
mod types;
mod validation;

pub use api::{ApiConfig, MetricsConfig};
pub use limits::LimitsConfig;
pub use moderation::ModerationConfig;
pub use types::{BotToken, Config, ConfigError, LEGACY_TOKEN_ENV_VAR, TOKEN_ENV_VAR};
pub use validation::{MAX_DURATION_SECS, ValidationError, validate};

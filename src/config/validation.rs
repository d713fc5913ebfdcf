//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Longest duration any timing setting may name (one year).
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("bot_token is required")]
    MissingToken,
    #[error("limits.rate_per_second must be greater than 0")]
    ZeroRate,
    #[error("limits.burst must be greater than 0")]
    ZeroBurst,
    #[error("limits.idle_threshold_secs must be greater than 0")]
    ZeroIdleThreshold,
    #[error("limits.sweep_interval_secs must be greater than 0")]
    ZeroSweepInterval,
    #[error("moderation.command_prefix must not be empty")]
    EmptyCommandPrefix,
    #[error("moderation.ban_delete_message_days must be at most 7, got {0}")]
    BanDeleteDaysTooLarge(u8),
    #[error("api.retry_attempts must be at least 1")]
    ZeroRetryAttempts,
    #[error("{field} must be at most one year, got {value} seconds")]
    DurationTooLarge { field: &'static str, value: u64 },
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bot_token.is_blank() {
        errors.push(ValidationError::MissingToken);
    }

    let limits = &config.limits;
    if limits.rate_per_second == 0 {
        errors.push(ValidationError::ZeroRate);
    }
    if limits.burst == 0 {
        errors.push(ValidationError::ZeroBurst);
    }
    if limits.idle_threshold_secs == 0 {
        errors.push(ValidationError::ZeroIdleThreshold);
    }
    if limits.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    let moderation = &config.moderation;
    if moderation.command_prefix.trim().is_empty() {
        errors.push(ValidationError::EmptyCommandPrefix);
    }
    if moderation.ban_delete_message_days > 7 {
        errors.push(ValidationError::BanDeleteDaysTooLarge(
            moderation.ban_delete_message_days,
        ));
    }

    if config.api.retry_attempts == 0 {
        errors.push(ValidationError::ZeroRetryAttempts);
    }

    let durations = [
        ("limits.idle_threshold_secs", limits.idle_threshold_secs),
        ("limits.sweep_interval_secs", limits.sweep_interval_secs),
        ("moderation.lockdown_cooldown_secs", moderation.lockdown_cooldown_secs),
        ("api.request_timeout_secs", config.api.request_timeout_secs),
        ("api.reconnect_delay_secs", config.api.reconnect_delay_secs),
        ("api.retry_delay_ms", config.api.retry_delay_ms / 1000),
    ];
    for (field, value) in durations {
        if value > MAX_DURATION_SECS {
            errors.push(ValidationError::DurationTooLarge { field, value });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

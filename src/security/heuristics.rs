//! Join-time heuristics for raid accounts.
//!
//! A joining member is flagged when:
//! - the username starts with the configured raid prefix
//! - the account (creation time taken from the user id) is younger than
//!   the configured minimum age

use crate::config::ModerationConfig;
use chrono::{DateTime, Duration, Utc};
use floodgate_proto::User;
use std::fmt;

/// Why a joining member should be kicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KickReason {
    /// Username matched the raid prefix.
    RaidUsername { prefix: String },
    /// Account is younger than the minimum age.
    YoungAccount { min_age_hours: u64 },
}

impl KickReason {
    /// Static label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::RaidUsername { .. } => "raid_username",
            Self::YoungAccount { .. } => "young_account",
        }
    }
}

impl fmt::Display for KickReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RaidUsername { prefix } => write!(f, "Username starts with '{prefix}'."),
            Self::YoungAccount { min_age_hours } => {
                write!(f, "Account created less than {min_age_hours} hours ago.")
            }
        }
    }
}

/// Evaluates joining members against the configured rules.
#[derive(Debug, Clone)]
pub struct JoinHeuristics {
    raid_prefix: String,
    min_age_hours: u64,
}

impl JoinHeuristics {
    pub fn new(config: &ModerationConfig) -> Self {
        Self {
            raid_prefix: config.raid_username_prefix.clone(),
            min_age_hours: config.min_account_age_hours,
        }
    }

    /// Every rule the user trips, in priority order. Empty means admit.
    pub fn evaluate(&self, user: &User, now: DateTime<Utc>) -> Vec<KickReason> {
        let mut reasons = Vec::new();

        if !self.raid_prefix.is_empty() && user.username.starts_with(&self.raid_prefix) {
            reasons.push(KickReason::RaidUsername {
                prefix: self.raid_prefix.clone(),
            });
        }

        if self.min_age_hours > 0 {
            match account_age(user, now) {
                Some(age) if age < self.min_age() => reasons.push(KickReason::YoungAccount {
                    min_age_hours: self.min_age_hours,
                }),
                Some(_) => {}
                None => {
                    tracing::warn!(user = %user.id, "Could not decode account creation time");
                }
            }
        }

        reasons
    }

    fn min_age(&self) -> Duration {
        i64::try_from(self.min_age_hours)
            .ok()
            .and_then(Duration::try_hours)
            .unwrap_or(Duration::MAX)
    }
}

/// Age of the account as of `now`, from the creation time in its id.
pub fn account_age(user: &User, now: DateTime<Utc>) -> Option<Duration> {
    user.id.timestamp().map(|created| now - created)
}

//! Per-channel flood limit configuration.

use serde::Deserialize;
use std::time::Duration;

/// Channel rate limits and idle eviction timing.
///
/// Every channel gets a token bucket holding `burst` tokens that refills at
/// `rate_per_second`. Channels quiet for longer than `idle_threshold_secs`
/// are dropped by the sweeper, which wakes every `sweep_interval_secs`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LimitsConfig {
    /// Sustained messages per second per channel (default: 20).
    #[serde(default = "default_rate_per_second")]
    pub rate_per_second: u32,
    /// Bucket capacity, i.e. the largest burst allowed (default: 40).
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Seconds of inactivity before a channel entry is evicted (default: 180).
    #[serde(default = "default_idle_threshold_secs")]
    pub idle_threshold_secs: u64,
    /// Seconds between sweeper passes (default: 60).
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl LimitsConfig {
    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_threshold_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            rate_per_second: default_rate_per_second(),
            burst: default_burst(),
            idle_threshold_secs: default_idle_threshold_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_rate_per_second() -> u32 {
    20
}

fn default_burst() -> u32 {
    40
}

fn default_idle_threshold_secs() -> u64 {
    180
}

fn default_sweep_interval_secs() -> u64 {
    60
}

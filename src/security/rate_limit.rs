//! Per-channel flood protection.
//!
//! Tracks every channel that produced a message recently, each with its own
//! governor token bucket and a last-seen timestamp. Entries are created on
//! first use and dropped by the idle sweeper once a channel goes quiet.
//!
//! # Architecture
//!
//! One `parking_lot::Mutex` guards the whole map. Lookup-or-insert, the
//! last-seen refresh and the sweeper's read-then-remove all happen inside a
//! single critical section, so a channel can never be created twice and an
//! entry refreshed by a message can never be evicted on a stale read.
//! Token consumption itself is lock-free inside governor.

use crate::config::LimitsConfig;
use crate::error::ActivityError;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter as GovRateLimiter};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Handle to one channel's token bucket.
///
/// Handed out instead of the registry entry itself. A handle kept past an
/// eviction keeps working against a bucket the registry no longer tracks;
/// the message path uses [`ActivityRegistry::allow`] to avoid that.
#[derive(Debug, Clone)]
pub struct LimiterHandle(Arc<DefaultDirectRateLimiter>);

impl LimiterHandle {
    /// Consume one token. Never blocks.
    ///
    /// Returns `true` if allowed, `false` if rate limited.
    #[inline]
    pub fn allow(&self) -> bool {
        self.0.check().is_ok()
    }

    /// Do both handles drive the same bucket?
    pub fn same_bucket(&self, other: &LimiterHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// One tracked channel.
#[derive(Debug)]
struct ChannelActivity {
    limiter: Arc<DefaultDirectRateLimiter>,
    last_seen: Instant,
}

/// Thread-safe registry of per-channel rate limiters.
#[derive(Debug)]
pub struct ActivityRegistry {
    /// Channel id -> bucket and last access.
    channels: Mutex<HashMap<String, ChannelActivity>>,
    /// Quota given to every new bucket.
    quota: Quota,
}

impl ActivityRegistry {
    /// Create a registry whose buckets follow the configured rate and burst.
    pub fn new(config: &LimitsConfig) -> Self {
        let rate = NonZeroU32::new(config.rate_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst).unwrap_or(NonZeroU32::MIN);
        Self::with_quota(Quota::per_second(rate).allow_burst(burst))
    }

    /// Create a registry with an explicit governor quota.
    pub fn with_quota(quota: Quota) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            quota,
        }
    }

    /// Look up a channel's bucket, creating a full one on first access.
    ///
    /// Refreshes the channel's last-seen time.
    pub fn get_or_create(&self, channel_id: &str) -> Result<LimiterHandle, ActivityError> {
        self.get_or_create_at(channel_id, Instant::now())
    }

    /// [`get_or_create`](Self::get_or_create) with an explicit access time.
    pub fn get_or_create_at(
        &self,
        channel_id: &str,
        now: Instant,
    ) -> Result<LimiterHandle, ActivityError> {
        validate_channel_id(channel_id)?;
        let mut channels = self.channels.lock();
        Ok(LimiterHandle(self.touch(&mut channels, channel_id, now)))
    }

    /// Check if a channel may receive another message right now.
    ///
    /// The lookup and the token consumption share one lock acquisition, so
    /// the bucket that answers is the one the registry tracks.
    ///
    /// Returns `true` if allowed, `false` if rate limited.
    pub fn allow(&self, channel_id: &str) -> Result<bool, ActivityError> {
        self.allow_at(channel_id, Instant::now())
    }

    /// [`allow`](Self::allow) with an explicit access time.
    pub fn allow_at(&self, channel_id: &str, now: Instant) -> Result<bool, ActivityError> {
        validate_channel_id(channel_id)?;
        let mut channels = self.channels.lock();
        let allowed = self.touch(&mut channels, channel_id, now).check().is_ok();
        if !allowed {
            debug!(channel = %channel_id, "channel rate limit exceeded");
        }
        Ok(allowed)
    }

    /// Remove a channel. Returns whether it was tracked.
    pub fn evict(&self, channel_id: &str) -> bool {
        self.channels.lock().remove(channel_id).is_some()
    }

    /// Drop every channel idle for longer than `idle_threshold` as of `now`.
    ///
    /// Returns the number of channels removed.
    pub fn sweep(&self, idle_threshold: Duration, now: Instant) -> usize {
        let mut channels = self.channels.lock();
        let before = channels.len();
        channels.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= idle_threshold);
        before - channels.len()
    }

    /// Is the channel currently tracked?
    pub fn contains(&self, channel_id: &str) -> bool {
        self.channels.lock().contains_key(channel_id)
    }

    /// Number of tracked channels.
    pub fn len(&self) -> usize {
        self.channels.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.lock().is_empty()
    }

    /// Refresh or create an entry and return its bucket. Caller holds the lock.
    fn touch(
        &self,
        channels: &mut HashMap<String, ChannelActivity>,
        channel_id: &str,
        now: Instant,
    ) -> Arc<DefaultDirectRateLimiter> {
        if let Some(entry) = channels.get_mut(channel_id) {
            entry.last_seen = entry.last_seen.max(now);
            return Arc::clone(&entry.limiter);
        }

        debug!(channel = %channel_id, "tracking new channel");
        let limiter = Arc::new(GovRateLimiter::direct(self.quota));
        channels.insert(
            channel_id.to_owned(),
            ChannelActivity {
                limiter: Arc::clone(&limiter),
                last_seen: now,
            },
        );
        limiter
    }
}

impl Default for ActivityRegistry {
    fn default() -> Self {
        Self::new(&LimitsConfig::default())
    }
}

fn validate_channel_id(channel_id: &str) -> Result<(), ActivityError> {
    if channel_id.trim().is_empty() {
        return Err(ActivityError::InvalidChannelId(channel_id.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    fn test_config() -> LimitsConfig {
        LimitsConfig {
            rate_per_second: 2,
            burst: 5,
            ..LimitsConfig::default()
        }
    }

    #[test]
    fn test_burst_then_denied() {
        let registry = ActivityRegistry::new(&test_config());

        // Full bucket on first sight
        for _ in 0..5 {
            assert!(registry.allow("c1").unwrap());
        }

        // Sixth within the same instant is denied
        assert!(!registry.allow("c1").unwrap());
    }

    #[test]
    fn test_different_channels_independent() {
        let registry = ActivityRegistry::new(&test_config());

        for _ in 0..5 {
            registry.allow("c1").unwrap();
        }
        assert!(!registry.allow("c1").unwrap());

        // c2 still has its whole burst
        assert!(registry.allow("c2").unwrap());
    }

    #[test]
    fn test_empty_channel_id_rejected() {
        let registry = ActivityRegistry::default();
        assert_eq!(
            registry.get_or_create("").unwrap_err(),
            ActivityError::InvalidChannelId(String::new())
        );
        assert!(registry.allow("   ").is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_get_or_create_reuses_entry() {
        let registry = ActivityRegistry::default();
        let a = registry.get_or_create("c1").unwrap();
        let b = registry.get_or_create("c1").unwrap();
        assert!(a.same_bucket(&b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_evict_is_idempotent() {
        let registry = ActivityRegistry::default();
        registry.get_or_create("c1").unwrap();
        assert!(registry.evict("c1"));
        assert!(!registry.evict("c1"));
        assert!(!registry.contains("c1"));
    }

    #[test]
    fn test_sweep_boundary_is_exclusive() {
        let registry = ActivityRegistry::default();
        let t0 = Instant::now();
        registry.get_or_create_at("edge", t0).unwrap();

        // idle == threshold stays
        assert_eq!(registry.sweep(3 * MINUTE, t0 + 3 * MINUTE), 0);
        assert!(registry.contains("edge"));

        // idle > threshold goes
        assert_eq!(
            registry.sweep(3 * MINUTE, t0 + 3 * MINUTE + Duration::from_millis(1)),
            1
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_refresh_keeps_entry_alive() {
        let registry = ActivityRegistry::default();
        let t0 = Instant::now();
        registry.get_or_create_at("c1", t0).unwrap();
        registry.get_or_create_at("c1", t0 + 2 * MINUTE).unwrap();

        assert_eq!(registry.sweep(3 * MINUTE, t0 + 4 * MINUTE), 0);
        assert!(registry.contains("c1"));
    }

    #[test]
    fn test_last_seen_never_moves_backwards() {
        let registry = ActivityRegistry::default();
        let t0 = Instant::now();
        registry.get_or_create_at("c1", t0 + 2 * MINUTE).unwrap();
        // An older timestamp arriving late must not age the entry
        registry.get_or_create_at("c1", t0).unwrap();

        assert_eq!(registry.sweep(3 * MINUTE, t0 + 4 * MINUTE), 0);
    }

    #[test]
    fn test_sweep_with_now_before_last_seen_keeps_entry() {
        let registry = ActivityRegistry::default();
        let t0 = Instant::now();
        registry.get_or_create_at("c1", t0 + MINUTE).unwrap();
        assert_eq!(registry.sweep(Duration::ZERO, t0), 0);
    }

    #[test]
    fn test_evicted_channel_returns_with_full_bucket() {
        let registry = ActivityRegistry::new(&test_config());
        for _ in 0..5 {
            registry.allow("c1").unwrap();
        }
        assert!(!registry.allow("c1").unwrap());

        registry.evict("c1");
        assert!(registry.allow("c1").unwrap());
    }
}

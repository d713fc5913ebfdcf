//! Idle channel sweeper background task.
//!
//! Wakes on a fixed period and drops every channel that has not seen a
//! message for longer than the idle threshold, bounding registry memory.
//! A channel that comes back after eviction starts with a full bucket.

use crate::config::LimitsConfig;
use crate::security::ActivityRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Longest period the sweeper waits between passes.
const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Sweeper timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSchedule {
    /// Time between passes.
    pub interval: Duration,
    /// Inactivity after which a channel is evicted.
    pub idle_threshold: Duration,
}

impl From<&LimitsConfig> for SweepSchedule {
    fn from(config: &LimitsConfig) -> Self {
        Self {
            interval: config.sweep_interval(),
            idle_threshold: config.idle_threshold(),
        }
    }
}

/// Spawn the idle sweeper.
///
/// The task stops when `shutdown` fires or its sender is dropped, and
/// resolves to the total number of channels it evicted.
pub fn spawn_sweeper(
    registry: Arc<ActivityRegistry>,
    schedule: SweepSchedule,
    shutdown: broadcast::Receiver<()>,
) -> JoinHandle<usize> {
    tokio::spawn(run_sweeper(registry, schedule, shutdown))
}

/// Sweep loop. First pass happens one full interval after start.
pub async fn run_sweeper(
    registry: Arc<ActivityRegistry>,
    schedule: SweepSchedule,
    mut shutdown: broadcast::Receiver<()>,
) -> usize {
    let period = schedule.interval.min(MAX_INTERVAL);
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut evicted_total = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let removed = registry.sweep(schedule.idle_threshold, Instant::now());
                evicted_total += removed;
                crate::metrics::record_sweep(removed, registry.len());
                if removed > 0 {
                    info!(removed, remaining = registry.len(), "Idle channels evicted");
                } else {
                    debug!(tracked = registry.len(), "Sweep found no idle channels");
                }
            }
            _ = shutdown.recv() => {
                info!(evicted_total, "Idle sweeper stopping");
                break;
            }
        }
    }

    evicted_total
}

/// Run exactly `cycles` sweep passes, one interval apart, then return the
/// number of channels evicted. The first pass happens after one interval.
pub async fn run_cycles(registry: &ActivityRegistry, schedule: SweepSchedule, cycles: usize) -> usize {
    let mut evicted = 0;
    for _ in 0..cycles {
        tokio::time::sleep(schedule.interval).await;
        evicted += registry.sweep(schedule.idle_threshold, Instant::now());
    }
    evicted
}

//! Prometheus metrics collection for floodgate.
//!
//! Exposed on the `/metrics` HTTP endpoint when enabled. Recording helpers
//! are no-ops until [`init`] has run, so library code and tests can call
//! them freely.
//!
//! - `floodgate_messages_total` - messages observed
//! - `floodgate_rate_limited_total` - messages denied by a channel bucket
//! - `floodgate_lockdowns_total` - lockdown requests issued
//! - `floodgate_members_kicked_total{reason}` - join-time kicks
//! - `floodgate_tracked_channels` - channels currently in the registry

use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Messages observed on the gateway.
pub static MESSAGES_SEEN: OnceLock<IntCounter> = OnceLock::new();

/// Messages denied by a channel's token bucket.
pub static RATE_LIMITED: OnceLock<IntCounter> = OnceLock::new();

/// Lockdown permission overwrites requested.
pub static LOCKDOWNS: OnceLock<IntCounter> = OnceLock::new();

/// Members banned through the ban command.
pub static BANS_ISSUED: OnceLock<IntCounter> = OnceLock::new();

/// Channels evicted by the idle sweeper.
pub static SWEEP_EVICTIONS: OnceLock<IntCounter> = OnceLock::new();

/// Join-time kicks by reason.
pub static MEMBERS_KICKED: OnceLock<IntCounterVec> = OnceLock::new();

/// Commands executed by name.
pub static COMMANDS: OnceLock<IntCounterVec> = OnceLock::new();

/// Handler errors by error code.
pub static HANDLER_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// REST calls retried after a 502, by operation.
pub static API_RETRIES: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

/// Channels currently tracked by the activity registry.
pub static TRACKED_CHANNELS: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup before the metrics endpoint is served.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(MESSAGES_SEEN, IntCounter::new("floodgate_messages_total", "Messages observed"));
    register!(RATE_LIMITED, IntCounter::new("floodgate_rate_limited_total", "Messages denied by a channel rate limit"));
    register!(LOCKDOWNS, IntCounter::new("floodgate_lockdowns_total", "Channel lockdowns requested"));
    register!(BANS_ISSUED, IntCounter::new("floodgate_bans_total", "Members banned by command"));
    register!(SWEEP_EVICTIONS, IntCounter::new("floodgate_sweep_evictions_total", "Idle channels evicted"));
    register!(TRACKED_CHANNELS, IntGauge::new("floodgate_tracked_channels", "Channels tracked by the rate limiter"));

    register!(MEMBERS_KICKED, IntCounterVec::new(Opts::new("floodgate_members_kicked_total", "Members kicked on join"), &["reason"]));
    register!(COMMANDS, IntCounterVec::new(Opts::new("floodgate_commands_total", "Chat commands executed"), &["command"]));
    register!(HANDLER_ERRORS, IntCounterVec::new(Opts::new("floodgate_handler_errors_total", "Event handler errors"), &["event", "error"]));
    register!(API_RETRIES, IntCounterVec::new(Opts::new("floodgate_api_retries_total", "REST calls retried after a bad gateway"), &["operation"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

fn inc(metric: &OnceLock<IntCounter>) {
    if let Some(c) = metric.get() {
        c.inc();
    }
}

fn inc_vec(metric: &OnceLock<IntCounterVec>, labels: &[&str]) {
    if let Some(c) = metric.get() {
        c.with_label_values(labels).inc();
    }
}

pub fn record_message() {
    inc(&MESSAGES_SEEN);
}

pub fn record_rate_limited() {
    inc(&RATE_LIMITED);
}

pub fn record_lockdown() {
    inc(&LOCKDOWNS);
}

pub fn record_ban() {
    inc(&BANS_ISSUED);
}

pub fn record_kick(reason: &str) {
    inc_vec(&MEMBERS_KICKED, &[reason]);
}

pub fn record_command(command: &str) {
    inc_vec(&COMMANDS, &[command]);
}

pub fn record_handler_error(event: &str, error: &str) {
    inc_vec(&HANDLER_ERRORS, &[event, error]);
}

pub fn record_api_retry(operation: &str) {
    inc_vec(&API_RETRIES, &[operation]);
}

/// Record one sweeper pass.
pub fn record_sweep(removed: usize, tracked: usize) {
    if let Some(c) = SWEEP_EVICTIONS.get() {
        c.inc_by(removed as u64);
    }
    if let Some(g) = TRACKED_CHANNELS.get() {
        g.set(i64::try_from(tracked).unwrap_or(i64::MAX));
    }
}

//! Security module for floodgate.
//!
//! Provides the anti-abuse core:
//! - **Rate Limiting**: per-channel governor token buckets with last-seen tracking
//! - **Sweeper**: background eviction of idle channels
//! - **Heuristics**: join-time raid detection (username prefix, account age)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Security Module                    │
//! ├──────────────────────┬──────────────┬───────────────┤
//! │   ActivityRegistry   │   Sweeper    │  Heuristics   │
//! │ Mutex<HashMap<..>>   │ interval +   │ raid prefix   │
//! │ governor per channel │ shutdown rx  │ snowflake age │
//! └──────────────────────┴──────────────┴───────────────┘
//! ```

pub mod heuristics;
pub mod rate_limit;
pub mod sweeper;

// Re-export primary types for convenience
pub use heuristics::{JoinHeuristics, KickReason};
pub use rate_limit::{ActivityRegistry, LimiterHandle};
pub use sweeper::{SweepSchedule, run_cycles, spawn_sweeper};

//! floodgate - channel flood lockdown and raid auto-moderation for Discord.
//!
//! Tracks message activity per channel with governor token buckets, locks a
//! channel for `@everyone` when it floods, and kicks joining accounts that
//! look like raid accounts. Idle channels are swept from memory in the
//! background.

pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod metrics;
pub mod network;
pub mod security;
pub mod state;

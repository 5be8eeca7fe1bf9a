//! Core types and errors for monitor sync
//!
//! This module contains the fundamental building blocks used throughout the library.

pub mod error;
pub mod types;

pub use self::error::{Error, Result};
pub use self::types::{
    PollRate,
    ReconcileConfig,
    SyncConfig,
};

/// Default UDP port for sync messages
pub const DEFAULT_PORT: u16 = 3000;

/// Default rate at which the server samples the power state
pub const DEFAULT_POLL_RATE_HZ: f64 = 1.0;

/// Slowest accepted poll rate, one sample every 1000 seconds
pub const MIN_POLL_RATE_HZ: f64 = 0.001;

/// Maximum actuation attempts per reconciliation
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Delay between an actuation and the read-back that checks it
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;

//! Governor Module
//!
//! Concurrency limiting and operation statistics.

mod permits;
mod stats;

pub use permits::ConcurrencyGovernor;
pub use stats::{DiskStats, StatsSnapshot, LATENCY_ALPHA};

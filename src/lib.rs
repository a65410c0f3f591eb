//! Disk Optimizer - disk-backed file cache and I/O tuning layer
//!
//! Shields file reads and writes behind a size- and count-bounded side-file
//! cache with LRU, LFU or TTL eviction, bounds concurrent disk operations and
//! grows its read buffer when observed latency is high.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod governor;
pub mod io;
pub mod models;
pub mod optimizer;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{DiskError, IoOp, Result};
pub use optimizer::DiskOptimizer;

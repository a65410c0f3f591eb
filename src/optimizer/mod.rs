//! Optimizer Module
//!
//! The public coordinator and its pluggable buffer-tuning strategy.

mod orchestrator;
mod tuning;

pub use orchestrator::{DiskOptimizer, OptimizeReport};
pub use tuning::{
    BufferTuner, FixedBuffer, LatencyThresholdTuner, DEFAULT_LATENCY_THRESHOLD, MAX_BUFFER_SIZE,
};

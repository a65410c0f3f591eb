//! Buffer Tuning Strategy
//!
//! Decides when the read buffer should grow.

use std::fmt::Debug;
use std::time::Duration;

use crate::governor::StatsSnapshot;

/// Smoothed read latency above which the buffer grows.
pub const DEFAULT_LATENCY_THRESHOLD: Duration = Duration::from_millis(100);

/// Absolute cap for the read buffer.
pub const MAX_BUFFER_SIZE: usize = 4 * 1024 * 1024;

// == Buffer Tuner ==
/// Closed-loop rule consulted by each maintenance pass.
pub trait BufferTuner: Send + Sync + Debug {
    /// Returns true when the read buffer should double.
    fn should_grow_buffer(&self, stats: &StatsSnapshot) -> bool;
}

// == Latency Threshold Tuner ==
/// Grows the buffer while smoothed read latency exceeds a threshold.
#[derive(Debug, Clone)]
pub struct LatencyThresholdTuner {
    pub threshold: Duration,
}

impl Default for LatencyThresholdTuner {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_LATENCY_THRESHOLD,
        }
    }
}

impl BufferTuner for LatencyThresholdTuner {
    fn should_grow_buffer(&self, stats: &StatsSnapshot) -> bool {
        stats.total_reads > 0 && stats.avg_read_latency() > self.threshold
    }
}

/// Never grows the buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedBuffer;

impl BufferTuner for FixedBuffer {
    fn should_grow_buffer(&self, _stats: &StatsSnapshot) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_latency(reads: u64, latency_ms: u64) -> StatsSnapshot {
        StatsSnapshot {
            total_reads: reads,
            avg_read_latency_us: latency_ms * 1000,
            ..StatsSnapshot::default()
        }
    }

    #[test]
    fn test_latency_threshold() {
        let tuner = LatencyThresholdTuner::default();
        assert!(!tuner.should_grow_buffer(&snapshot_with_latency(10, 50)));
        assert!(!tuner.should_grow_buffer(&snapshot_with_latency(10, 100)));
        assert!(tuner.should_grow_buffer(&snapshot_with_latency(10, 101)));
    }

    #[test]
    fn test_no_reads_never_grows() {
        let tuner = LatencyThresholdTuner::default();
        assert!(!tuner.should_grow_buffer(&snapshot_with_latency(0, 500)));
    }

    #[test]
    fn test_fixed_buffer() {
        assert!(!FixedBuffer.should_grow_buffer(&snapshot_with_latency(10, 10_000)));
    }
}

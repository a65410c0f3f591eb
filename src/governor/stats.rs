//! Disk Statistics Module
//!
//! Tracks operation counters, bytes moved and smoothed latencies.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// Weight of the newest sample in the latency moving average.
pub const LATENCY_ALPHA: f64 = 0.1;

// == Disk Stats ==
/// Shared operation statistics.
///
/// Plain counters are atomics; the moving averages are read-modify-write on
/// floats and sit behind a mutex. Construct one per optimizer (or per test)
/// and share it through an `Arc`.
#[derive(Debug, Default)]
pub struct DiskStats {
    total_reads: AtomicU64,
    total_writes: AtomicU64,
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
    read_errors: AtomicU64,
    write_errors: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    samples: AtomicU64,
    latency: Mutex<Latency>,
    last_sample: Mutex<Option<DateTime<Utc>>>,
}

/// Smoothed latencies in seconds, with the sample counts that seed them.
#[derive(Debug, Default, Clone, Copy)]
struct Latency {
    read: f64,
    write: f64,
    reads: u64,
    writes: u64,
}

impl DiskStats {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Read ==
    /// Records a completed read. `bytes` is None when the read failed.
    pub fn record_read(&self, duration: Duration, bytes: Option<u64>) {
        self.total_reads.fetch_add(1, Ordering::Relaxed);
        match bytes {
            Some(n) => {
                self.bytes_read.fetch_add(n, Ordering::Relaxed);
            }
            None => {
                self.read_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
        let mut latency = self.latency.lock();
        latency.read = smooth(latency.read, duration, latency.reads == 0);
        latency.reads += 1;
    }

    // == Record Write ==
    /// Records a completed write. `bytes` is None when the write failed.
    pub fn record_write(&self, duration: Duration, bytes: Option<u64>) {
        self.total_writes.fetch_add(1, Ordering::Relaxed);
        match bytes {
            Some(n) => {
                self.bytes_written.fetch_add(n, Ordering::Relaxed);
            }
            None => {
                self.write_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
        let mut latency = self.latency.lock();
        latency.write = smooth(latency.write, duration, latency.writes == 0);
        latency.writes += 1;
    }

    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    // == Sample ==
    /// Marks a sampler tick.
    ///
    /// OS-level disk utilisation is not collected; the tick only refreshes
    /// the timestamp and bumps the sample counter.
    pub fn sample(&self) {
        *self.last_sample.lock() = Some(Utc::now());
        self.samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Smoothed read latency.
    pub fn avg_read_latency(&self) -> Duration {
        Duration::from_secs_f64(self.latency.lock().read)
    }

    pub fn samples(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }

    // == Reset ==
    /// Zeroes every counter. Intended for test isolation.
    pub fn reset(&self) {
        for counter in [
            &self.total_reads,
            &self.total_writes,
            &self.bytes_read,
            &self.bytes_written,
            &self.read_errors,
            &self.write_errors,
            &self.cache_hits,
            &self.cache_misses,
            &self.samples,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        *self.latency.lock() = Latency::default();
        *self.last_sample.lock() = None;
    }

    // == Snapshot ==
    /// Copies the counters into a serialisable snapshot.
    ///
    /// Cache occupancy and buffer size are filled in by the optimizer.
    pub fn snapshot(&self) -> StatsSnapshot {
        let latency = *self.latency.lock();
        StatsSnapshot {
            total_reads: self.total_reads.load(Ordering::Relaxed),
            total_writes: self.total_writes.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            avg_read_latency_us: (latency.read * 1_000_000.0).round() as u64,
            avg_write_latency_us: (latency.write * 1_000_000.0).round() as u64,
            samples: self.samples.load(Ordering::Relaxed),
            last_sample: *self.last_sample.lock(),
            ..StatsSnapshot::default()
        }
    }
}

/// Exponential moving average step; the first sample seeds the average.
fn smooth(current: f64, sample: Duration, first: bool) -> f64 {
    let sample = sample.as_secs_f64();
    if first {
        sample
    } else {
        current * (1.0 - LATENCY_ALPHA) + sample * LATENCY_ALPHA
    }
}

// == Stats Snapshot ==
/// Point-in-time copy of the optimizer statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsSnapshot {
    pub total_reads: u64,
    pub total_writes: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub read_errors: u64,
    pub write_errors: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Smoothed read latency in microseconds
    pub avg_read_latency_us: u64,
    /// Smoothed write latency in microseconds
    pub avg_write_latency_us: u64,
    pub cache_size: u64,
    pub cache_files: usize,
    pub evictions: u64,
    pub expirations: u64,
    pub buffer_size: usize,
    pub samples: u64,
    pub last_sample: Option<DateTime<Utc>>,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub fn avg_read_latency(&self) -> Duration {
        Duration::from_micros(self.avg_read_latency_us)
    }
}

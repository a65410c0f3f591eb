//! Disk Optimizer
//!
//! Public coordinator tying the cache store, concurrency governor, I/O engine
//! and statistics together.

use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{ensure_live, DiskError, IoOp, Result};
use crate::governor::{ConcurrencyGovernor, DiskStats, StatsSnapshot};
use crate::io::IoEngine;
use crate::optimizer::{BufferTuner, LatencyThresholdTuner, MAX_BUFFER_SIZE};
use crate::tasks::{spawn_maintenance_task, spawn_sampler_task};

// == Optimize Report ==
/// Outcome of one maintenance pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OptimizeReport {
    /// Expired entries removed
    pub expired: usize,
    /// Entries evicted to restore the budget
    pub evicted: usize,
    /// Read buffer size after the pass
    pub buffer_size: usize,
    /// Whether the pass grew the buffer
    pub buffer_grown: bool,
}

// == Disk Optimizer ==
/// Cache-first reads, write-through writes and periodic self-tuning.
#[derive(Debug)]
pub struct DiskOptimizer {
    config: Config,
    /// None when caching is disabled
    cache: Option<Arc<RwLock<CacheStore>>>,
    engine: IoEngine,
    governor: ConcurrencyGovernor,
    stats: Arc<DiskStats>,
    tuner: Box<dyn BufferTuner>,
    /// Cancelled on shutdown; stops background tasks
    shutdown: CancellationToken,
    closed: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl DiskOptimizer {
    // == Constructor ==
    /// Creates an optimizer with fresh statistics and the latency-threshold tuner.
    pub fn new(config: Config) -> Self {
        Self::with_parts(
            config,
            Arc::new(DiskStats::new()),
            Box::new(LatencyThresholdTuner::default()),
        )
    }

    /// Creates an optimizer around injected statistics and tuning strategy.
    pub fn with_parts(config: Config, stats: Arc<DiskStats>, tuner: Box<dyn BufferTuner>) -> Self {
        let cache = config
            .cache_enabled
            .then(|| Arc::new(RwLock::new(CacheStore::from_config(&config))));

        if config.direct_io {
            info!("Direct I/O requested; treated as a hint, page cache stays in use");
        }
        info!(
            "Disk optimizer initialized: cache_enabled={}, policy={}, max_cache_files={}, max_concurrent_operations={}",
            config.cache_enabled,
            config.eviction_policy,
            config.max_cache_files,
            config.max_concurrent_operations
        );

        Self {
            engine: IoEngine::from_config(&config),
            governor: ConcurrencyGovernor::new(config.max_concurrent_operations),
            cache,
            stats,
            tuner,
            shutdown: CancellationToken::new(),
            closed: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
            config,
        }
    }

    // == Start ==
    /// Spawns the metrics sampler and maintenance loop.
    ///
    /// Both stop when `shutdown` runs or the optimizer is dropped.
    pub fn start(self: &Arc<Self>) {
        let mut tasks = self.tasks.lock();

        if self.config.metrics_interval.is_zero() {
            warn!("Metrics interval is zero, sampler disabled");
        } else {
            tasks.push(spawn_sampler_task(
                Arc::clone(&self.stats),
                self.cache.clone(),
                self.config.metrics_interval,
                self.shutdown.child_token(),
            ));
        }

        if self.config.maintenance_interval.is_zero() {
            warn!("Maintenance interval is zero, maintenance loop disabled");
        } else {
            tasks.push(spawn_maintenance_task(
                Arc::downgrade(self),
                self.config.maintenance_interval,
                self.shutdown.child_token(),
            ));
        }
    }

    // == Read ==
    /// Reads a file, serving it from the cache when possible.
    ///
    /// On a miss the file is read under a concurrency permit and, if
    /// non-empty, cached for the next caller.
    pub async fn read(&self, path: &Path, cancel: &CancellationToken) -> Result<Vec<u8>> {
        self.ensure_running()?;
        ensure_live(cancel, IoOp::Read, path)?;
        let key = cache_key(path);

        if let Some(cache) = &self.cache {
            if let Some(data) = cache.write().await.get(&key).await {
                self.stats.record_hit();
                debug!("Cache hit: {}", key);
                return Ok(data);
            }
        }
        self.stats.record_miss();

        let started = Instant::now();
        let result = self
            .bounded(IoOp::Read, path, async {
                let _permit = self.governor.acquire(cancel, IoOp::Read, path).await?;
                self.engine.read(path, cancel).await
            })
            .await;
        self.stats.record_read(
            started.elapsed(),
            result.as_ref().ok().map(|data| data.len() as u64),
        );
        let data = result?;

        if let Some(cache) = &self.cache {
            if !data.is_empty() {
                if let Err(err) = cache.write().await.put(&key, &data).await {
                    warn!("Failed to cache {}: {}", key, err);
                }
            }
        }

        Ok(data)
    }

    // == Write ==
    /// Writes a file through the I/O engine, then refreshes the cache.
    ///
    /// The cache is only touched after the backing write succeeds.
    pub async fn write(&self, path: &Path, data: &[u8], cancel: &CancellationToken) -> Result<()> {
        self.ensure_running()?;
        ensure_live(cancel, IoOp::Write, path)?;

        let started = Instant::now();
        let result = self
            .bounded(IoOp::Write, path, async {
                let _permit = self.governor.acquire(cancel, IoOp::Write, path).await?;
                self.engine.write(path, data, cancel).await
            })
            .await;
        self.stats.record_write(
            started.elapsed(),
            result.as_ref().ok().map(|_| data.len() as u64),
        );
        result?;

        if let Some(cache) = &self.cache {
            let key = cache_key(path);
            let mut store = cache.write().await;
            if let Err(err) = store.put(&key, data).await {
                // The side file may be truncated, so the old entry cannot be trusted
                store.remove(&key).await;
                warn!("Failed to refresh cache for {}, entry dropped: {}", key, err);
            }
        }

        Ok(())
    }

    // == Stats ==
    /// Returns counters plus current cache occupancy and buffer size.
    pub async fn stats(&self) -> StatsSnapshot {
        let mut snapshot = self.stats.snapshot();
        if let Some(cache) = &self.cache {
            let store = cache.read().await;
            snapshot.cache_size = store.size();
            snapshot.cache_files = store.file_count();
            snapshot.evictions = store.evictions();
            snapshot.expirations = store.expirations();
        }
        snapshot.buffer_size = self.engine.buffer_size();
        snapshot
    }

    // == Optimize Disk ==
    /// Maintenance pass: purge expired entries, restore the cache budget and
    /// grow the read buffer if the tuner asks for it.
    pub async fn optimize_disk(&self) -> Result<OptimizeReport> {
        self.ensure_running()?;
        let mut report = OptimizeReport::default();

        if let Some(cache) = &self.cache {
            let mut store = cache.write().await;
            report.expired = store.cleanup_expired().await;
            if store.is_over_budget() {
                report.evicted = store.enforce_budget().await;
            }
        }

        let snapshot = self.stats().await;
        if self.tuner.should_grow_buffer(&snapshot) {
            if let Some(size) = self.engine.grow_buffer(MAX_BUFFER_SIZE) {
                info!(
                    "Read latency {:?} over threshold, buffer grown to {} bytes",
                    snapshot.avg_read_latency(),
                    size
                );
                report.buffer_grown = true;
            }
        }
        report.buffer_size = self.engine.buffer_size();

        debug!(
            "Optimization pass: expired={}, evicted={}, buffer_size={}",
            report.expired, report.evicted, report.buffer_size
        );
        Ok(report)
    }

    // == Shutdown ==
    /// Stops background tasks and clears the cache. Safe to call repeatedly.
    pub async fn shutdown(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!("Disk optimizer already shut down");
            return Ok(());
        }

        self.shutdown.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(err) = task.await {
                warn!("Background task ended abnormally: {}", err);
            }
        }
        self.governor.close();

        if let Some(cache) = &self.cache {
            let removed = cache.write().await.close().await;
            info!("Cache closed, {} entries removed", removed);
        }

        info!("Disk optimizer shut down");
        Ok(())
    }

    // == Accessors ==
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared cache store, None when caching is disabled.
    pub fn cache(&self) -> Option<&Arc<RwLock<CacheStore>>> {
        self.cache.as_ref()
    }

    pub fn disk_stats(&self) -> &Arc<DiskStats> {
        &self.stats
    }

    pub fn buffer_size(&self) -> usize {
        self.engine.buffer_size()
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // == Internal Helpers ==
    fn ensure_running(&self) -> Result<()> {
        if self.is_shut_down() {
            Err(DiskError::ShutDown)
        } else {
            Ok(())
        }
    }

    /// Applies the I/O timeout to a permit wait plus the operation itself.
    async fn bounded<T>(
        &self,
        op: IoOp,
        path: &Path,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let after = self.config.io_timeout;
        match tokio::time::timeout(after, fut).await {
            Ok(result) => result,
            Err(_) => Err(DiskError::Timeout {
                op,
                path: path.to_path_buf(),
                after,
            }),
        }
    }
}

impl Drop for DiskOptimizer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Cache key for a path. `.` parts and repeated separators are dropped so
/// every spelling of one file shares an entry.
fn cache_key(path: &Path) -> String {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect::<PathBuf>()
        .to_string_lossy()
        .into_owned()
}

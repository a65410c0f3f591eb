//! Metrics Sampler Task
//!
//! Background task that ticks the statistics sampler at a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::governor::DiskStats;

/// Spawns a task that calls [`DiskStats::sample`] once per `period` and logs
/// cache occupancy.
///
/// The first sample is taken one full period after spawning. Missed ticks
/// are delayed rather than bursted, so a slow tick never produces a double
/// sample. The task ends when `shutdown` is cancelled.
pub fn spawn_sampler_task(
    stats: Arc<DiskStats>,
    cache: Option<Arc<RwLock<CacheStore>>>,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting metrics sampler with interval of {:?}", period);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            stats.sample();
            if let Some(cache) = &cache {
                let store = cache.read().await;
                debug!(
                    "Cache occupancy: {} files, {} bytes",
                    store.file_count(),
                    store.size()
                );
            }
        }

        info!("Metrics sampler stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sampler_fires_once_per_interval() {
        let stats = Arc::new(DiskStats::new());
        let token = CancellationToken::new();
        let handle = spawn_sampler_task(
            Arc::clone(&stats),
            None,
            Duration::from_secs(30),
            token.clone(),
        );

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(stats.samples(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(stats.samples(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(stats.samples(), 3);
        assert!(stats.snapshot().last_sample.is_some());

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sampler_stops_on_shutdown() {
        let stats = Arc::new(DiskStats::new());
        let token = CancellationToken::new();
        let handle = spawn_sampler_task(
            Arc::clone(&stats),
            None,
            Duration::from_secs(1),
            token.clone(),
        );

        tokio::time::sleep(Duration::from_millis(2500)).await;
        token.cancel();
        handle.await.unwrap();

        let before = stats.samples();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(stats.samples(), before);
        assert_eq!(before, 2);
    }
}

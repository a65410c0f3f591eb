//! Maintenance Task
//!
//! Background task that periodically runs the optimizer's maintenance pass.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::optimizer::DiskOptimizer;

/// Spawns a task that calls `optimize_disk` once per `period`.
///
/// The first pass runs one full period after spawning. The task holds only a
/// weak reference, so it ends when the optimizer is dropped or `shutdown` is
/// cancelled, whichever comes first.
///
/// # Example
/// ```ignore
/// let optimizer = Arc::new(DiskOptimizer::new(Config::default()));
/// let token = CancellationToken::new();
/// let handle = spawn_maintenance_task(Arc::downgrade(&optimizer), Duration::from_secs(300), token.clone());
/// // Later, during shutdown:
/// token.cancel();
/// handle.await?;
/// ```
pub fn spawn_maintenance_task(
    optimizer: Weak<DiskOptimizer>,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting maintenance task with interval of {:?}", period);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let Some(optimizer) = optimizer.upgrade() else {
                break;
            };
            match optimizer.optimize_disk().await {
                Ok(report) if report.expired > 0 || report.evicted > 0 => info!(
                    "Maintenance: removed {} expired and {} evicted entries",
                    report.expired, report.evicted
                ),
                Ok(_) => debug!("Maintenance: nothing to do"),
                Err(err) => warn!("Maintenance pass failed: {}", err),
            }
        }

        info!("Maintenance task stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn overfull_optimizer(root: &TempDir) -> Arc<DiskOptimizer> {
        let config = Config {
            cache_dir: root.path().join("cache"),
            max_cache_size: 10,
            ..Config::default()
        };
        Arc::new(DiskOptimizer::new(config))
    }

    #[tokio::test]
    async fn test_maintenance_task_restores_budget() {
        let root = TempDir::new().unwrap();
        let optimizer = overfull_optimizer(&root);
        {
            let mut store = optimizer.cache().unwrap().write().await;
            store.put("a", &[0; 6]).await.unwrap();
            store.put("b", &[0; 6]).await.unwrap();
            store.put("c", &[0; 12]).await.unwrap();
            assert!(store.is_over_budget());
        }

        let token = CancellationToken::new();
        let handle = spawn_maintenance_task(
            Arc::downgrade(&optimizer),
            Duration::from_millis(30),
            token.clone(),
        );

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!optimizer.cache().unwrap().read().await.is_over_budget());

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_maintenance_task_stops_when_optimizer_dropped() {
        let root = TempDir::new().unwrap();
        let optimizer = overfull_optimizer(&root);
        let handle = spawn_maintenance_task(
            Arc::downgrade(&optimizer),
            Duration::from_millis(10),
            CancellationToken::new(),
        );

        drop(optimizer);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("task should stop after the optimizer is dropped")
            .unwrap();
    }

    #[tokio::test]
    async fn test_maintenance_task_can_be_cancelled() {
        let root = TempDir::new().unwrap();
        let optimizer = overfull_optimizer(&root);
        let token = CancellationToken::new();
        let handle = spawn_maintenance_task(
            Arc::downgrade(&optimizer),
            Duration::from_secs(3600),
            token.clone(),
        );

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("task should stop on cancellation")
            .unwrap();
    }
}

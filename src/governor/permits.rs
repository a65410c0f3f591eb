//! Concurrency Permits
//!
//! Bounds the number of disk operations in flight.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::error::{ensure_live, DiskError, IoOp, Result};

// == Concurrency Governor ==
/// Fixed-size permit pool. The permit is released when it is dropped.
#[derive(Debug, Clone)]
pub struct ConcurrencyGovernor {
    permits: Arc<Semaphore>,
}

impl ConcurrencyGovernor {
    /// Creates a pool of `max` permits (at least one).
    pub fn new(max: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max.max(1))),
        }
    }

    // == Acquire ==
    /// Waits for a permit until one frees up or `cancel` fires.
    ///
    /// Fails with `Cancelled` on cancellation and `ShutDown` once the pool
    /// has been closed.
    pub async fn acquire(
        &self,
        cancel: &CancellationToken,
        op: IoOp,
        path: &Path,
    ) -> Result<OwnedSemaphorePermit> {
        ensure_live(cancel, op, path)?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DiskError::cancelled(op, path)),
            permit = Arc::clone(&self.permits).acquire_owned() => {
                permit.map_err(|_| DiskError::ShutDown)
            }
        }
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Closes the pool; pending and future acquisitions fail.
    pub fn close(&self) {
        self.permits.close();
    }
}

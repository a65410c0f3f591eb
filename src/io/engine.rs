//! Buffered File I/O Engine
//!
//! Size-aware reads and writes with pooled buffers, chunked transfer and
//! periodic durability syncs.

use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::Config;
use crate::error::{ensure_live, DiskError, IoOp, Result};
use crate::io::BufferPool;

// == I/O Engine ==
/// Reads and writes whole files. Knows nothing about caching.
#[derive(Debug)]
pub struct IoEngine {
    /// Read buffer size; grows at runtime, never shrinks
    buffer_size: AtomicUsize,
    write_buffer_size: usize,
    /// Bytes written between syncs during chunked writes
    sync_threshold: usize,
    /// Read buffers, sized to `buffer_size`
    pool: BufferPool,
    /// Chunk staging buffers, sized to `write_buffer_size`
    write_pool: BufferPool,
    syncs: AtomicU64,
}

impl IoEngine {
    // == Constructor ==
    pub fn new(
        buffer_size: usize,
        write_buffer_size: usize,
        sync_threshold: usize,
        max_idle_buffers: usize,
    ) -> Self {
        Self {
            buffer_size: AtomicUsize::new(buffer_size.max(1)),
            write_buffer_size: write_buffer_size.max(1),
            sync_threshold,
            pool: BufferPool::new(max_idle_buffers),
            write_pool: BufferPool::new(max_idle_buffers),
            syncs: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.io_buffer_size,
            config.write_buffer_size,
            config.sync_threshold,
            config.max_concurrent_operations * 2,
        )
    }

    // == Read ==
    /// Reads a whole file.
    ///
    /// Files larger than the buffer size are streamed through a pooled
    /// buffer; cancellation is checked between fills and never yields
    /// partial data.
    pub async fn read(&self, path: &Path, cancel: &CancellationToken) -> Result<Vec<u8>> {
        ensure_live(cancel, IoOp::Read, path)?;

        let mut file = File::open(path)
            .await
            .map_err(|err| DiskError::io(IoOp::Read, path, err))?;
        let len = file
            .metadata()
            .await
            .map_err(|err| DiskError::io(IoOp::Read, path, err))?
            .len() as usize;
        if len == 0 {
            return Ok(Vec::new());
        }

        let buffer_size = self.buffer_size();
        let mut data = Vec::with_capacity(len);

        if len <= buffer_size {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DiskError::cancelled(IoOp::Read, path)),
                res = file.read_to_end(&mut data) => {
                    res.map_err(|err| DiskError::io(IoOp::Read, path, err))?;
                }
            }
            return Ok(data);
        }

        let mut buf = self.pool.get(buffer_size);
        loop {
            let n = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DiskError::cancelled(IoOp::Read, path)),
                res = file.read(&mut buf[..]) => {
                    res.map_err(|err| DiskError::io(IoOp::Read, path, err))?
                }
            };
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
        }

        Ok(data)
    }

    // == Write ==
    /// Writes a whole file, creating parent directories and truncating any
    /// existing content.
    ///
    /// Payloads larger than the write buffer go out in chunks staged through
    /// a pooled buffer; each time `sync_threshold` bytes accumulate the file
    /// is flushed and synced. A cancelled write may leave a partial file behind.
    pub async fn write(&self, path: &Path, data: &[u8], cancel: &CancellationToken) -> Result<()> {
        ensure_live(cancel, IoOp::Write, path)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| DiskError::io(IoOp::CreateDir, parent, err))?;
        }

        let mut file = File::create(path)
            .await
            .map_err(|err| DiskError::io(IoOp::Write, path, err))?;

        if data.len() <= self.write_buffer_size {
            file.write_all(data)
                .await
                .map_err(|err| DiskError::io(IoOp::Write, path, err))?;
            return file
                .flush()
                .await
                .map_err(|err| DiskError::io(IoOp::Write, path, err));
        }

        let mut staging = self.write_pool.get(self.write_buffer_size);
        let mut since_sync = 0usize;

        for chunk in data.chunks(self.write_buffer_size) {
            let staged = &mut staging[..chunk.len()];
            staged.copy_from_slice(chunk);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DiskError::cancelled(IoOp::Write, path)),
                res = file.write_all(staged) => {
                    res.map_err(|err| DiskError::io(IoOp::Write, path, err))?;
                }
            }

            since_sync += chunk.len();
            if since_sync >= self.sync_threshold {
                file.flush()
                    .await
                    .map_err(|err| DiskError::io(IoOp::Write, path, err))?;
                file.sync_data()
                    .await
                    .map_err(|err| DiskError::io(IoOp::Write, path, err))?;
                self.syncs.fetch_add(1, Ordering::Relaxed);
                debug!("Synced {} bytes of {}", since_sync, path.display());
                since_sync = 0;
            }
        }

        file.flush()
            .await
            .map_err(|err| DiskError::io(IoOp::Write, path, err))
    }

    // == Buffer Tuning ==
    /// Current read buffer size.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size.load(Ordering::Relaxed)
    }

    /// Doubles the read buffer, capped at `max`.
    ///
    /// Returns the new size, or None when already at the cap.
    pub fn grow_buffer(&self, max: usize) -> Option<usize> {
        self.buffer_size
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let next = current.saturating_mul(2).min(max);
                (next > current).then_some(next)
            })
            .ok()
            .map(|previous| previous.saturating_mul(2).min(max))
    }

    /// Number of mid-write durability syncs performed.
    pub fn syncs(&self) -> u64 {
        self.syncs.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    const BUF: usize = 1024;

    fn engine() -> IoEngine {
        IoEngine::new(BUF, BUF, 4 * BUF, 4)
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[tokio::test]
    async fn test_round_trip_boundaries() {
        let dir = TempDir::new().unwrap();
        let engine = engine();
        let token = CancellationToken::new();

        for len in [0, 1, BUF - 1, BUF, BUF + 1, 10 * BUF + 7] {
            let path = dir.path().join(format!("file_{}.bin", len));
            let data = pattern(len);

            engine.write(&path, &data, &token).await.unwrap();
            let read = engine.read(&path, &token).await.unwrap();

            assert_eq!(read, data, "round trip mismatch for {} bytes", len);
        }
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs_and_truncates() {
        let dir = TempDir::new().unwrap();
        let engine = engine();
        let token = CancellationToken::new();
        let path = dir.path().join("nested/deeper/file.bin");

        engine.write(&path, &pattern(3 * BUF), &token).await.unwrap();
        engine.write(&path, b"short", &token).await.unwrap();

        assert_eq!(engine.read(&path, &token).await.unwrap(), b"short");
    }

    #[tokio::test]
    async fn test_chunked_write_syncs_at_threshold() {
        let dir = TempDir::new().unwrap();
        let engine = IoEngine::new(BUF, BUF, 2 * BUF, 4);
        let token = CancellationToken::new();
        let path = dir.path().join("big.bin");

        // Five chunks: 1 KiB x 4 + 512 bytes; syncs after chunks 2 and 4
        engine
            .write(&path, &pattern(4 * BUF + 512), &token)
            .await
            .unwrap();
        assert_eq!(engine.syncs(), 2);

        engine.write(&path, &pattern(BUF / 2), &token).await.unwrap();
        assert_eq!(engine.syncs(), 2);
    }

    #[tokio::test]
    async fn test_read_missing_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.bin");

        let err = engine()
            .read(&path, &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            DiskError::Io { op, path: p, source } => {
                assert_eq!(op, IoOp::Read);
                assert_eq!(p, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_token_fails_without_side_effects() {
        let dir = TempDir::new().unwrap();
        let engine = engine();
        let token = CancellationToken::new();
        token.cancel();
        let path = dir.path().join("never.bin");

        let write = engine.write(&path, b"data", &token).await;
        assert!(write.unwrap_err().is_cancelled());
        assert!(!path.exists());

        std::fs::write(&path, b"data").unwrap();
        let read = engine.read(&path, &token).await;
        assert!(read.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_streamed_read_returns_buffer_to_pool() {
        let dir = TempDir::new().unwrap();
        let engine = engine();
        let token = CancellationToken::new();
        let path = dir.path().join("stream.bin");
        std::fs::write(&path, pattern(5 * BUF)).unwrap();

        engine.read(&path, &token).await.unwrap();
        assert_eq!(engine.pool.idle(), 1);
    }

    #[tokio::test]
    async fn test_chunked_write_reuses_staging_buffer() {
        let dir = TempDir::new().unwrap();
        let engine = engine();
        let token = CancellationToken::new();

        for i in 0..3 {
            let path = dir.path().join(format!("chunked_{}.bin", i));
            let data = pattern(3 * BUF + 100);
            engine.write(&path, &data, &token).await.unwrap();
            assert_eq!(std::fs::read(&path).unwrap(), data);
            assert_eq!(engine.write_pool.idle(), 1);
        }
        // Staging buffers never land in the read pool
        assert_eq!(engine.pool.idle(), 0);
    }

    fn cancel_after(token: &CancellationToken, delay: Duration) {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            token.cancel();
        });
    }

    #[tokio::test]
    async fn test_streamed_read_cancelled_midway() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("large.bin");
        std::fs::write(&path, pattern(4 * 1024 * 1024)).unwrap();
        let engine = IoEngine::new(16, BUF, 4 * BUF, 4);
        let token = CancellationToken::new();
        cancel_after(&token, Duration::from_millis(5));

        let result = engine.read(&path, &token).await;

        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(engine.pool.idle(), 1);
    }

    #[tokio::test]
    async fn test_chunked_write_cancelled_midway() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.bin");
        let data = pattern(4 * 1024 * 1024);
        let engine = IoEngine::new(BUF, 16, usize::MAX, 4);
        let token = CancellationToken::new();
        cancel_after(&token, Duration::from_millis(5));

        let result = engine.write(&path, &data, &token).await;

        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(engine.write_pool.idle(), 1);
        assert!(std::fs::metadata(&path).unwrap().len() < data.len() as u64);
    }

    #[test]
    fn test_grow_buffer_doubles_and_caps() {
        let engine = IoEngine::new(1024, 1024, 4096, 1);

        assert_eq!(engine.grow_buffer(3000), Some(2048));
        assert_eq!(engine.grow_buffer(3000), Some(3000));
        assert_eq!(engine.grow_buffer(3000), None);
        assert_eq!(engine.buffer_size(), 3000);

        // A lower cap never shrinks the buffer
        assert_eq!(engine.grow_buffer(512), None);
        assert_eq!(engine.buffer_size(), 3000);
    }
}

//! Buffer Pool
//!
//! Reusable byte buffers shared by concurrent reads.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

// == Buffer Pool ==
/// A bounded free list of equally sized buffers.
///
/// Borrowed buffers are owned by the borrower until the guard drops. Buffers
/// whose length no longer matches the requested size are discarded, so the
/// pool follows buffer-size changes without flushing.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
    max_idle: usize,
}

impl BufferPool {
    /// Creates a pool retaining at most `max_idle` returned buffers.
    pub fn new(max_idle: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    // == Get ==
    /// Borrows a buffer of exactly `size` bytes.
    pub fn get(&self, size: usize) -> PooledBuffer<'_> {
        let reused = {
            let mut free = self.free.lock();
            // Drop stale buffers left over from a smaller buffer size
            free.retain(|buf| buf.len() == size);
            free.pop()
        };
        PooledBuffer {
            buf: Some(reused.unwrap_or_else(|| vec![0; size])),
            pool: self,
        }
    }

    /// Number of buffers waiting for reuse.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    fn put_back(&self, buf: Vec<u8>) {
        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            free.push(buf);
        }
    }
}

// == Pooled Buffer ==
/// Exclusive handle to a pooled buffer; returns it to the pool on drop.
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    buf: Option<Vec<u8>>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or_default()
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or_default()
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.put_back(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_get_returns_sized_buffer() {
        let pool = BufferPool::new(4);
        let buf = pool.get(1024);
        assert_eq!(buf.len(), 1024);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_buffer_is_reused() {
        let pool = BufferPool::new(4);
        {
            let mut buf = pool.get(16);
            buf[0] = 42;
        }
        assert_eq!(pool.idle(), 1);

        let buf = pool.get(16);
        assert_eq!(buf[0], 42);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_size_change_discards_stale_buffers() {
        let pool = BufferPool::new(4);
        drop(pool.get(16));
        drop(pool.get(16));
        assert_eq!(pool.idle(), 1);

        let buf = pool.get(32);
        assert_eq!(buf.len(), 32);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_idle_limit() {
        let pool = BufferPool::new(2);
        let a = pool.get(8);
        let b = pool.get(8);
        let c = pool.get(8);
        drop(a);
        drop(b);
        drop(c);
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn test_concurrent_borrowers_get_distinct_buffers() {
        let pool = Arc::new(BufferPool::new(8));
        let handles: Vec<_> = (0..8u8)
            .map(|id| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let mut buf = pool.get(64);
                        buf.fill(id);
                        std::thread::yield_now();
                        assert!(buf.iter().all(|b| *b == id));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(pool.idle() <= 8);
    }
}

//! I/O Module
//!
//! Buffered file reads and writes behind a shared buffer pool.

mod buffer_pool;
mod engine;

pub use buffer_pool::{BufferPool, PooledBuffer};
pub use engine::IoEngine;

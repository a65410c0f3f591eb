//! Cache Module
//!
//! Disk-backed side-file cache with LRU, LFU and TTL eviction.

mod entry;
mod order;
mod policy;
mod store;


// Re-export public types
pub use entry::{checksum, side_file_path, CacheEntry};
pub use order::AccessOrder;
pub use policy::EvictionPolicy;
pub use store::CacheStore;

//! Cache Entry Module
//!
//! Defines the metadata record kept for each cached side file.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

/// Extension used for cache side files.
const SIDE_FILE_EXTENSION: &str = "cache";

// == Cache Entry ==
/// Metadata for one cached payload. The bytes themselves live in the side file.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Logical key (usually a file path)
    pub key: String,
    /// Side file holding the cached bytes
    pub location: PathBuf,
    /// Payload length in bytes
    pub size: u64,
    /// Insertion time
    pub created_at: Instant,
    /// Last successful lookup
    pub last_accessed_at: Instant,
    /// Number of successful lookups since insertion
    pub access_count: u64,
    /// Lifetime from creation, None = no expiration
    pub ttl: Option<Duration>,
    /// Hex SHA-256 of the payload, diagnostic only
    pub checksum: String,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry for a payload that was just written to `location`.
    pub fn new(key: String, location: PathBuf, data: &[u8], ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            key,
            location,
            size: data.len() as u64,
            created_at: now,
            last_accessed_at: now,
            access_count: 0,
            ttl: ttl.filter(|ttl| !ttl.is_zero()),
            checksum: checksum(data),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has outlived its TTL.
    ///
    /// An entry expires once strictly more than `ttl` has elapsed since creation.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(self.created_at) > ttl,
            None => false,
        }
    }

    // == Touch ==
    /// Records a successful lookup.
    pub fn touch(&mut self) {
        self.last_accessed_at = Instant::now();
        self.access_count += 1;
    }

    /// Remaining lifetime, or None if the entry never expires.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.ttl.map(|ttl| ttl.saturating_sub(self.created_at.elapsed()))
    }
}

// == Utility Functions ==
/// Side file path for a key: `<dir>/<sha256(key)>.cache`.
///
/// Depends only on the key, so re-putting a key overwrites the same file.
pub fn side_file_path(dir: &Path, key: &str) -> PathBuf {
    let digest = Sha256::digest(key.as_bytes());
    dir.join(format!("{}.{}", hex::encode(digest), SIDE_FILE_EXTENSION))
}

/// Hex SHA-256 of a payload.
pub fn checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

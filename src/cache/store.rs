//! Cache Store Module
//!
//! Side-file cache combining HashMap metadata with an access order, TTL
//! expiration and size/count budgets.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::cache::entry::side_file_path;
use crate::cache::{AccessOrder, CacheEntry, EvictionPolicy};
use crate::config::Config;
use crate::error::{DiskError, IoOp, Result};

// == Cache Store ==
/// Disk-backed cache keyed by logical path.
///
/// Not internally synchronised: share it as `Arc<RwLock<CacheStore>>` and take
/// the write lock for every call that needs `&mut self`, `get` included.
#[derive(Debug)]
pub struct CacheStore {
    /// Entry metadata by key
    entries: HashMap<String, CacheEntry>,
    /// Eviction order
    order: AccessOrder,
    /// Directory holding side files
    cache_dir: PathBuf,
    policy: EvictionPolicy,
    /// Aggregate size budget in bytes
    max_size: u64,
    /// Entry count budget
    max_files: usize,
    /// TTL for new entries, None = never expire
    default_ttl: Option<Duration>,
    /// Sum of entry sizes, maintained incrementally
    current_size: u64,
    evictions: u64,
    expirations: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store rooted at `cache_dir`.
    ///
    /// A failure to create the directory is logged; later puts will then fail
    /// with an I/O error instead.
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        max_size: u64,
        max_files: usize,
        policy: EvictionPolicy,
        default_ttl: Duration,
    ) -> Self {
        let cache_dir = cache_dir.into();
        if let Err(err) = std::fs::create_dir_all(&cache_dir) {
            warn!(
                "Failed to create cache directory {}: {}",
                cache_dir.display(),
                err
            );
        }

        Self {
            entries: HashMap::new(),
            order: AccessOrder::new(),
            cache_dir,
            policy,
            max_size,
            max_files,
            default_ttl: Some(default_ttl).filter(|ttl| !ttl.is_zero()),
            current_size: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    /// Creates a store from the cache section of the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.cache_dir.clone(),
            config.max_cache_size,
            config.max_cache_files,
            config.eviction_policy,
            config.default_ttl,
        )
    }

    // == Get ==
    /// Returns the cached bytes for `key`, or None on a miss.
    ///
    /// Expired entries are removed. A side file that can no longer be read
    /// drops its entry and counts as a miss.
    pub async fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        let expired = self.entries.get(key)?.is_expired_at(Instant::now());
        if expired {
            self.remove_entry(key).await;
            self.expirations += 1;
            debug!("Cache entry expired: {}", key);
            return None;
        }

        let location = {
            let entry = self.entries.get_mut(key)?;
            entry.touch();
            entry.location.clone()
        };
        if self.policy.promotes_on_access() {
            self.order.touch(key);
        }

        match fs::read(&location).await {
            Ok(data) => Some(data),
            Err(err) => {
                warn!(
                    "Dropping cache entry {}: {}",
                    key,
                    DiskError::io(IoOp::CacheRead, &location, err)
                );
                self.remove_entry(key).await;
                None
            }
        }
    }

    // == Put ==
    /// Stores `data` under `key`, replacing any previous entry.
    ///
    /// The side file is written first; if that fails nothing else changes.
    /// When the insert leaves the store over budget exactly one victim is
    /// evicted.
    pub async fn put(&mut self, key: &str, data: &[u8]) -> Result<()> {
        let location = side_file_path(&self.cache_dir, key);
        fs::write(&location, data)
            .await
            .map_err(|err| DiskError::io(IoOp::CacheWrite, &location, err))?;

        // The side file now holds the new bytes; only the metadata is replaced.
        self.detach(key);

        let entry = CacheEntry::new(key.to_string(), location, data, self.default_ttl);
        self.current_size += entry.size;
        self.entries.insert(key.to_string(), entry);
        self.order.insert(key);

        if self.is_over_budget() {
            self.evict_one().await;
        }

        Ok(())
    }

    // == Remove ==
    /// Removes an entry and its side file. Returns true if the key was cached.
    pub async fn remove(&mut self, key: &str) -> bool {
        self.remove_entry(key).await.is_some()
    }

    // == Evict ==
    /// Removes one victim chosen by the eviction policy.
    pub async fn evict_one(&mut self) -> Option<String> {
        let victim = self.policy.select_victim(&self.entries, &self.order)?;
        self.remove_entry(&victim).await;
        self.evictions += 1;
        debug!("Evicted cache entry {} ({} policy)", victim, self.policy);
        Some(victim)
    }

    /// Evicts until both budgets hold. Returns the number of entries evicted.
    pub async fn enforce_budget(&mut self) -> usize {
        let mut evicted = 0;
        while self.is_over_budget() {
            if self.evict_one().await.is_none() {
                break;
            }
            evicted += 1;
        }
        if evicted > 0 {
            info!("Budget enforcement evicted {} cache entries", evicted);
        }
        evicted
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.remove_entry(&key).await;
        }
        self.expirations += count as u64;
        count
    }

    // == Close ==
    /// Removes every entry and its side file. Returns the number removed.
    pub async fn close(&mut self) -> usize {
        let removed = self.entries.len();
        for (_, entry) in self.entries.drain() {
            delete_side_file(&entry.location).await;
        }
        self.order.clear();
        self.current_size = 0;
        removed
    }

    // == Accessors ==
    /// Aggregate size of cached payloads in bytes.
    pub fn size(&self) -> u64 {
        self.current_size
    }

    /// Number of cached entries, expired-but-unvisited ones included.
    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Metadata for `key` without touching it.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }

    pub fn is_over_budget(&self) -> bool {
        self.current_size > self.max_size || self.entries.len() > self.max_files
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn expirations(&self) -> u64 {
        self.expirations
    }

    // == Internal Helpers ==
    /// Drops an entry from the map and order without touching its side file.
    fn detach(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.order.remove(key);
        self.current_size -= entry.size;
        Some(entry)
    }

    async fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.detach(key)?;
        delete_side_file(&entry.location).await;
        Some(entry)
    }
}

/// Deletes a side file. Failures are logged and otherwise ignored.
async fn delete_side_file(location: &Path) {
    match fs::remove_file(location).await {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!("{}", DiskError::io(IoOp::Remove, location, err)),
    }
}

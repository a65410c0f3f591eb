//! Configuration Module
//!
//! Handles loading and managing optimizer configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::EvictionPolicy;

const KIB: usize = 1024;
const MIB: usize = 1024 * KIB;
const GIB: u64 = 1024 * 1024 * 1024;

/// Disk optimizer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether reads and writes go through the side-file cache
    pub cache_enabled: bool,
    /// Directory holding cache side files
    pub cache_dir: PathBuf,
    /// Maximum aggregate size of cached payloads in bytes
    pub max_cache_size: u64,
    /// Maximum number of cached entries
    pub max_cache_files: usize,
    /// Victim selection rule when a budget is exceeded
    pub eviction_policy: EvictionPolicy,
    /// TTL applied to every new entry; zero disables expiry
    pub default_ttl: Duration,
    /// Read buffer size in bytes
    pub io_buffer_size: usize,
    /// Write buffer size in bytes
    pub write_buffer_size: usize,
    /// Bytes written between durability syncs during chunked writes
    pub sync_threshold: usize,
    /// Maximum number of in-flight disk operations
    pub max_concurrent_operations: usize,
    /// Upper bound on a single read or write, permit wait included
    pub io_timeout: Duration,
    /// Interval of the statistics sampler
    pub metrics_interval: Duration,
    /// Interval of the background maintenance pass
    pub maintenance_interval: Duration,
    /// Direct I/O hint (not enforced)
    pub direct_io: bool,
    /// Root directory served by the HTTP layer
    pub data_dir: PathBuf,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DISK_CACHE_ENABLED` - Enable caching (default: true)
    /// - `DISK_CACHE_DIR` - Cache directory (default: /tmp/disk_cache)
    /// - `DISK_MAX_CACHE_SIZE` - Max cache size in bytes (default: 1 GiB)
    /// - `DISK_MAX_CACHE_FILES` - Max cached entries (default: 1000)
    /// - `DISK_EVICTION_POLICY` - lru, lfu or ttl (default: lru)
    /// - `DISK_DEFAULT_TTL` - Entry TTL in seconds (default: 86400)
    /// - `DISK_IO_BUFFER_SIZE` - Read buffer in bytes (default: 64 KiB)
    /// - `DISK_WRITE_BUFFER_SIZE` - Write buffer in bytes (default: 64 KiB)
    /// - `DISK_SYNC_THRESHOLD` - Sync threshold in bytes (default: 1 MiB)
    /// - `DISK_MAX_CONCURRENT_OPS` - Concurrent operation limit (default: 10)
    /// - `DISK_IO_TIMEOUT` - I/O timeout in seconds (default: 30)
    /// - `DISK_METRICS_INTERVAL` - Sampler interval in seconds (default: 30)
    /// - `DISK_MAINTENANCE_INTERVAL` - Maintenance interval in seconds (default: 300)
    /// - `DISK_DIRECT_IO` - Direct I/O hint (default: false)
    /// - `DISK_DATA_DIR` - HTTP data root (default: /tmp/disk_optimizer/data)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_enabled: env_or("DISK_CACHE_ENABLED", defaults.cache_enabled),
            cache_dir: env::var("DISK_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            max_cache_size: env_or("DISK_MAX_CACHE_SIZE", defaults.max_cache_size),
            max_cache_files: env_or("DISK_MAX_CACHE_FILES", defaults.max_cache_files),
            eviction_policy: env::var("DISK_EVICTION_POLICY")
                .map(|v| EvictionPolicy::from_name(&v))
                .unwrap_or(defaults.eviction_policy),
            default_ttl: env_secs("DISK_DEFAULT_TTL", defaults.default_ttl),
            io_buffer_size: env_or("DISK_IO_BUFFER_SIZE", defaults.io_buffer_size),
            write_buffer_size: env_or("DISK_WRITE_BUFFER_SIZE", defaults.write_buffer_size),
            sync_threshold: env_or("DISK_SYNC_THRESHOLD", defaults.sync_threshold),
            max_concurrent_operations: env_or(
                "DISK_MAX_CONCURRENT_OPS",
                defaults.max_concurrent_operations,
            ),
            io_timeout: env_secs("DISK_IO_TIMEOUT", defaults.io_timeout),
            metrics_interval: env_secs("DISK_METRICS_INTERVAL", defaults.metrics_interval),
            maintenance_interval: env_secs(
                "DISK_MAINTENANCE_INTERVAL",
                defaults.maintenance_interval,
            ),
            direct_io: env_or("DISK_DIRECT_IO", defaults.direct_io),
            data_dir: env::var("DISK_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_secs(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_dir: PathBuf::from("/tmp/disk_cache"),
            max_cache_size: GIB,
            max_cache_files: 1000,
            eviction_policy: EvictionPolicy::Lru,
            default_ttl: Duration::from_secs(24 * 60 * 60),
            io_buffer_size: 64 * KIB,
            write_buffer_size: 64 * KIB,
            sync_threshold: MIB,
            max_concurrent_operations: 10,
            io_timeout: Duration::from_secs(30),
            metrics_interval: Duration::from_secs(30),
            maintenance_interval: Duration::from_secs(300),
            direct_io: false,
            data_dir: PathBuf::from("/tmp/disk_optimizer/data"),
            server_port: 3000,
        }
    }
}

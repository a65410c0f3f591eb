//! Response DTOs for the disk optimizer API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::governor::StatsSnapshot;
use crate::optimizer::OptimizeReport;

/// Response body for a file write (PUT /files/*path)
#[derive(Debug, Clone, Serialize)]
pub struct WriteResponse {
    /// Success message
    pub message: String,
    /// Path relative to the data root
    pub path: String,
    /// Payload length
    pub bytes_written: usize,
}

impl WriteResponse {
    pub fn new(path: impl Into<String>, bytes_written: usize) -> Self {
        let path = path.into();
        Self {
            message: format!("File '{}' written successfully", path),
            path,
            bytes_written,
        }
    }
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    /// Cache hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<StatsSnapshot> for StatsResponse {
    fn from(stats: StatsSnapshot) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for POST /optimize
#[derive(Debug, Clone, Serialize)]
pub struct OptimizeResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: OptimizeReport,
}

impl From<OptimizeReport> for OptimizeResponse {
    fn from(report: OptimizeReport) -> Self {
        Self {
            message: "Optimization pass complete".to_string(),
            report,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

//! Error types for the disk optimizer
//!
//! Provides unified error handling using thiserror.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

// == I/O Operation Kind ==
/// The operation that was in progress when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Read,
    Write,
    CacheRead,
    CacheWrite,
    Remove,
    CreateDir,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IoOp::Read => "read",
            IoOp::Write => "write",
            IoOp::CacheRead => "cache read",
            IoOp::CacheWrite => "cache write",
            IoOp::Remove => "remove",
            IoOp::CreateDir => "create dir",
        };
        f.write_str(name)
    }
}

// == Disk Error Enum ==
/// Unified error type for the disk optimizer.
#[derive(Error, Debug)]
pub enum DiskError {
    /// Underlying filesystem failure
    #[error("{op} failed for {}: {}", path.display(), source.kind())]
    Io {
        op: IoOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Caller cancelled the operation
    #[error("{op} cancelled for {}", path.display())]
    Cancelled { op: IoOp, path: PathBuf },

    /// Permit wait or I/O exceeded the configured timeout
    #[error("{op} timed out after {after:?} for {}", path.display())]
    Timeout {
        op: IoOp,
        path: PathBuf,
        after: Duration,
    },

    /// Rejected request path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The optimizer has been shut down
    #[error("Disk optimizer is shut down")]
    ShutDown,
}

impl DiskError {
    /// Wraps an `io::Error` with the operation and path it came from.
    pub fn io(op: IoOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        DiskError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Caller-side cancellation of `op` on `path`.
    pub fn cancelled(op: IoOp, path: impl Into<PathBuf>) -> Self {
        DiskError::Cancelled {
            op,
            path: path.into(),
        }
    }

    /// Returns true for caller-side cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DiskError::Cancelled { .. })
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for DiskError {
    fn into_response(self) -> Response {
        let status = match &self {
            DiskError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                StatusCode::NOT_FOUND
            }
            DiskError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            DiskError::Cancelled { .. } => StatusCode::REQUEST_TIMEOUT,
            DiskError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            DiskError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            DiskError::ShutDown => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the disk optimizer.
pub type Result<T> = std::result::Result<T, DiskError>;

/// Fails with `Cancelled` if `cancel` has already fired.
pub(crate) fn ensure_live(cancel: &CancellationToken, op: IoOp, path: &Path) -> Result<()> {
    if cancel.is_cancelled() {
        Err(DiskError::cancelled(op, path))
    } else {
        Ok(())
    }
}

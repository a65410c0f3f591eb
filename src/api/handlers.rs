//! API Handlers
//!
//! HTTP request handlers exposing the disk optimizer.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{DiskError, Result};
use crate::models::{FilePath, HealthResponse, OptimizeResponse, StatsResponse, WriteResponse};
use crate::optimizer::DiskOptimizer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared optimizer
    pub optimizer: Arc<DiskOptimizer>,
    /// Root that request paths resolve against
    pub data_dir: Arc<PathBuf>,
}

impl AppState {
    /// Creates a new AppState around an existing optimizer.
    pub fn new(optimizer: Arc<DiskOptimizer>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            optimizer,
            data_dir: Arc::new(data_dir.into()),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        let optimizer = Arc::new(DiskOptimizer::new(config.clone()));
        Self::new(optimizer, config.data_dir.clone())
    }

    /// Validates a request path and anchors it under the data root.
    fn resolve(&self, raw: &str) -> Result<(FilePath, PathBuf)> {
        let file = FilePath::parse(raw).map_err(DiskError::InvalidPath)?;
        let path = file.resolve(&self.data_dir);
        Ok((file, path))
    }
}

/// Handler for GET /files/*path
///
/// Returns the raw file bytes, from the cache when warm.
pub async fn read_handler(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse> {
    let (_, path) = state.resolve(&raw)?;
    let data = state
        .optimizer
        .read(&path, &CancellationToken::new())
        .await?;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data))
}

/// Handler for PUT /files/*path
///
/// Writes the request body to the file and refreshes the cache.
pub async fn write_handler(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    body: Bytes,
) -> Result<Json<WriteResponse>> {
    let (file, path) = state.resolve(&raw)?;
    state
        .optimizer
        .write(&path, &body, &CancellationToken::new())
        .await?;

    Ok(Json(WriteResponse::new(file.display(), body.len())))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.optimizer.stats().await))
}

/// Handler for POST /optimize
///
/// Runs one maintenance pass on demand.
pub async fn optimize_handler(State(state): State<AppState>) -> Result<Json<OptimizeResponse>> {
    let report = state.optimizer.optimize_disk().await?;
    Ok(Json(OptimizeResponse::from(report)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

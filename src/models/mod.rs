//! Request and Response models for the disk optimizer API
//!
//! This module defines path validation for incoming requests and the DTOs
//! serialized into HTTP response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{FilePath, MAX_PATH_LENGTH};
pub use responses::{HealthResponse, OptimizeResponse, StatsResponse, WriteResponse};

//! API Module
//!
//! HTTP handlers and routing over the disk optimizer.
//!
//! # Endpoints
//! - `GET /files/*path` - Read a file
//! - `PUT /files/*path` - Write a file
//! - `GET /stats` - Optimizer statistics
//! - `POST /optimize` - Run a maintenance pass
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the optimizer is live.
//!
//! # Tasks
//! - Metrics sampler: refreshes the statistics sample timestamp
//! - Maintenance: runs the optimizer's cleanup, eviction and tuning pass

mod maintenance;
mod sampler;

pub use maintenance::spawn_maintenance_task;
pub use sampler::spawn_sampler_task;

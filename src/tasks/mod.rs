//! Background Tasks Module
//!
//! # Tasks
//! - Cache sweep: removes expired entries from all caches at a fixed interval
//!   (only started when `SWEEP_INTERVAL_SECS` is non-zero)

mod sweep;

pub use sweep::spawn_sweep_task;

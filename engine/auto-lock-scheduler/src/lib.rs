//! # AutoLockScheduler
//!
//! Periodic batch job that closes rosters ahead of qualifying.
//!
//! Each run looks for upcoming races whose qualifying session starts within the
//! lookahead horizon, locks every open team whose league locks at qualifying,
//! commits the updates in bounded batches and marks the race in progress. Runs
//! only ever move a team from unlocked to locked, so re-running after a partial
//! failure or alongside another run is safe.

pub mod config;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod scheduler;


#[cfg(test)]
mod integration_tests;

pub use config::{RetryPolicy, SchedulerConfig};
pub use error::SchedulerError;
pub use metrics::{MetricsCollector, RunReport, SchedulerMetrics};
pub use scheduler::AutoLockScheduler;

/// Default time between runs (15 minutes)
pub const DEFAULT_INTERVAL_SECS: u64 = 15 * 60;

/// Default qualifying lookahead (1 hour)
pub const DEFAULT_HORIZON_SECS: u64 = 60 * 60;

//! Error types for the AutoLockScheduler

use team_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scheduler is already running")]
    AlreadyRunning,
}

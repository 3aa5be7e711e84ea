//! Run reports and metrics for the AutoLockScheduler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome of one scheduler run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: Option<DateTime<Utc>>,

    /// Upcoming races with qualifying inside the horizon
    pub races_considered: usize,

    /// Unlocked teams read across all considered races
    pub teams_scanned: usize,

    /// Lock operations queued for teams on an at-qualifying policy
    pub teams_locked: usize,

    pub batches_committed: usize,

    /// Team documents actually changed by the store
    pub writes: usize,

    /// Races moved to in progress
    pub races_started: usize,

    pub errors: Vec<String>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Cumulative totals across runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerMetrics {
    pub runs: u64,
    pub failed_runs: u64,
    pub teams_locked: u64,
    pub writes: u64,
    pub batches_committed: u64,
    pub races_started: u64,
}

/// Metrics collector for the AutoLockScheduler
#[derive(Debug, Default)]
pub struct MetricsCollector {
    runs: AtomicU64,
    failed_runs: AtomicU64,
    teams_locked: AtomicU64,
    writes: AtomicU64,
    batches_committed: AtomicU64,
    races_started: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a finished run into the totals and emit it through the metrics facade
    pub fn record_run(&self, report: &RunReport) {
        self.runs.fetch_add(1, Ordering::Relaxed);
        if !report.is_success() {
            self.failed_runs.fetch_add(1, Ordering::Relaxed);
        }
        self.teams_locked.fetch_add(report.teams_locked as u64, Ordering::Relaxed);
        self.writes.fetch_add(report.writes as u64, Ordering::Relaxed);
        self.batches_committed.fetch_add(report.batches_committed as u64, Ordering::Relaxed);
        self.races_started.fetch_add(report.races_started as u64, Ordering::Relaxed);

        metrics::counter!("auto_lock_runs_total", 1);
        if !report.is_success() {
            metrics::counter!("auto_lock_failed_runs_total", 1);
        }
        metrics::counter!("auto_lock_teams_locked_total", report.teams_locked as u64);
        metrics::counter!("auto_lock_writes_total", report.writes as u64);
        metrics::counter!("auto_lock_batches_total", report.batches_committed as u64);
        metrics::counter!("auto_lock_races_started_total", report.races_started as u64);
    }

    pub fn get_metrics(&self) -> SchedulerMetrics {
        SchedulerMetrics {
            runs: self.runs.load(Ordering::Relaxed),
            failed_runs: self.failed_runs.load(Ordering::Relaxed),
            teams_locked: self.teams_locked.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            batches_committed: self.batches_committed.load(Ordering::Relaxed),
            races_started: self.races_started.load(Ordering::Relaxed),
        }
    }
}

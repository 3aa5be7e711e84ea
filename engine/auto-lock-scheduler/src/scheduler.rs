//! Core AutoLockScheduler implementation

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

use lockout_resolver::{LeagueId, Race, RaceStatus};
use team_store::{Store, WriteBatch, WriteOp};

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::metrics::{MetricsCollector, RunReport, SchedulerMetrics};
use crate::retry::with_retry;

/// Locks open rosters ahead of qualifying
pub struct AutoLockScheduler {
    store: Arc<dyn Store>,
    config: SchedulerConfig,
    is_running: AtomicBool,
    shutdown: Notify,
    metrics: MetricsCollector,
}

impl AutoLockScheduler {
    pub fn new(store: Arc<dyn Store>, config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        tracing::info!(
            "Creating AutoLockScheduler: every {}s, {}s qualifying horizon",
            config.interval_secs,
            config.horizon_secs
        );
        Ok(Self {
            store,
            config,
            is_running: AtomicBool::new(false),
            shutdown: Notify::new(),
            metrics: MetricsCollector::new(),
        })
    }

    /// Run on the configured interval until `stop` is called.
    ///
    /// The first run starts immediately. A run that overruns the interval
    /// skips the missed ticks instead of queueing them.
    pub async fn run_forever(&self) -> Result<(), SchedulerError> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyRunning);
        }
        tracing::info!("Starting AutoLockScheduler loop");

        let mut ticker = tokio::time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while self.is_running.load(Ordering::SeqCst) {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.run_once(Utc::now()).await;
                    if !report.is_success() {
                        tracing::warn!("Auto-lock run finished with {} errors; retrying next interval", report.errors.len());
                    }
                }
                _ = self.shutdown.notified() => break,
            }
        }

        self.is_running.store(false, Ordering::SeqCst);
        tracing::info!("AutoLockScheduler loop stopped");
        Ok(())
    }

    /// Stop the run loop after the current run
    pub fn stop(&self) {
        self.is_running.store(false, Ordering::SeqCst);
        self.shutdown.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    pub fn get_metrics(&self) -> SchedulerMetrics {
        self.metrics.get_metrics()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// One pass over the calendar as of `now`. Failures are recorded in the
    /// report, never returned.
    pub async fn run_once(&self, now: DateTime<Utc>) -> RunReport {
        let mut report = RunReport { started_at: Some(now), ..RunReport::default() };

        match with_retry(&self.config.retry, "load races", || self.store.races()).await {
            Ok(races) => {
                let due = races_due(&races, now, now + self.config.horizon());
                report.races_considered = due.len();
                for race in due {
                    self.lock_for_race(race, now, &mut report).await;
                }
            }
            Err(e) => report.errors.push(format!("load races: {}", e)),
        }

        if report.races_considered > 0 || !report.is_success() {
            tracing::info!(
                "Auto-lock run: {} races, {} teams scanned, {} locked, {} writes in {} batches, {} errors",
                report.races_considered,
                report.teams_scanned,
                report.teams_locked,
                report.writes,
                report.batches_committed,
                report.errors.len()
            );
        } else {
            tracing::debug!("Auto-lock run: no qualifying sessions inside the horizon");
        }
        self.metrics.record_run(&report);
        report
    }

    async fn lock_for_race(&self, race: &Race, now: DateTime<Utc>, report: &mut RunReport) {
        let retry = &self.config.retry;

        let teams = match with_retry(retry, "load unlocked teams", || self.store.unlocked_teams()).await {
            Ok(teams) => teams,
            Err(e) => {
                report.errors.push(format!("{}: load unlocked teams: {}", race.id, e));
                return;
            }
        };
        report.teams_scanned += teams.len();

        let league_ids: Vec<LeagueId> =
            teams.iter().filter_map(|t| t.league_id.clone()).collect::<BTreeSet<_>>().into_iter().collect();
        let policies = if league_ids.is_empty() {
            Default::default()
        } else {
            match with_retry(retry, "load lock policies", || self.store.lock_policies(&league_ids)).await {
                Ok(policies) => policies,
                Err(e) => {
                    report.errors.push(format!("{}: load lock policies: {}", race.id, e));
                    return;
                }
            }
        };

        let reason = format!("Auto-locked for {} qualifying", race.name);
        let ops: Vec<WriteOp> = teams
            .iter()
            .filter(|team| {
                team.league_id
                    .as_ref()
                    .and_then(|league| policies.get(league))
                    .copied()
                    .unwrap_or_default()
                    .locks_at_qualifying()
            })
            .map(|team| WriteOp::LockForRace {
                team_id: team.id.clone(),
                reason: reason.clone(),
                next_unlock_time: Some(race.race_start()),
                locked_at: now,
            })
            .collect();
        report.teams_locked += ops.len();

        let mut failed = false;
        for batch in WriteBatch::chunked(ops) {
            match with_retry(retry, "commit lock batch", || self.store.commit(batch.clone())).await {
                Ok(changed) => {
                    report.batches_committed += 1;
                    report.writes += changed;
                }
                Err(e) => {
                    report.errors.push(format!("{}: commit lock batch: {}", race.id, e));
                    failed = true;
                }
            }
        }
        if failed {
            // Leave the race upcoming so the next run picks up the remaining teams
            return;
        }

        match with_retry(retry, "start race", || self.store.set_race_status(&race.id, RaceStatus::InProgress)).await {
            Ok(()) => {
                report.races_started += 1;
                tracing::info!("Race {} ({}) moved to in progress", race.id, race.name);
            }
            Err(e) => report.errors.push(format!("{}: start race: {}", race.id, e)),
        }
    }
}

/// Upcoming races whose qualifying starts within `[from, until]`
pub fn races_due(races: &[Race], from: DateTime<Utc>, until: DateTime<Utc>) -> Vec<&Race> {
    races
        .iter()
        .filter(|race| race.status == RaceStatus::Upcoming)
        .filter(|race| {
            let qualifying = race.qualifying_time();
            qualifying >= from && qualifying <= until
        })
        .collect()
}

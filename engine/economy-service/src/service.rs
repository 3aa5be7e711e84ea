//! Service state management and component initialization

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

use auto_lock_scheduler::AutoLockScheduler;
use budget_ledger::BudgetLedger;
use pricing_engine::PriceCalculator;
use team_store::{create_store, Store};

use crate::config::ServiceConfig;
use crate::market::Market;
use crate::race_day::RaceDay;
use crate::seed::SeedData;
use crate::teams::TeamService;

/// Service state containing all initialized components
pub struct ServiceState {
    pub config: ServiceConfig,

    pub store: Arc<dyn Store>,

    pub market: Arc<Market>,

    /// Team operations, serialized per team
    pub teams: Arc<TeamService>,

    pub race_day: Arc<RaceDay>,

    pub scheduler: Arc<AutoLockScheduler>,
}

impl ServiceState {
    /// Create a new service state with all components initialized
    pub async fn new(config: ServiceConfig) -> Result<Self> {
        info!("Initializing service components...");

        info!("Opening {:?} store...", config.store.backend);
        let store = create_store(&config.store).await.context("Failed to open team store")?;
        Self::with_store(config, store)
    }

    /// Wire components around an existing store
    pub fn with_store(config: ServiceConfig, store: Arc<dyn Store>) -> Result<Self> {
        let market = Arc::new(Market::new(
            store.clone(),
            PriceCalculator::new(config.pricing.clone()),
            config.ledger.star_eligible_count,
        ));
        let teams = Arc::new(TeamService::new(
            store.clone(),
            market.clone(),
            BudgetLedger::new(config.ledger.clone()),
        ));
        let race_day = Arc::new(RaceDay::new(store.clone(), market.clone(), teams.clone()));

        let scheduler = Arc::new(
            AutoLockScheduler::new(store.clone(), config.scheduler.clone())
                .context("Failed to create AutoLockScheduler")?,
        );

        info!("Service components initialized successfully");
        Ok(Self { config, store, market, teams, race_day, scheduler })
    }

    /// Load the configured seed file, if any
    pub async fn load_seed(&self) -> Result<()> {
        let Some(path) = self.config.service.seed_file.as_deref() else {
            info!("No seed file configured");
            return Ok(());
        };
        let seed = SeedData::from_file(path)?;
        seed.apply(self.store.as_ref(), &self.market).await
    }

    /// Run the auto-lock scheduler until stopped
    pub async fn start_scheduler(&self) -> Result<()> {
        info!("Starting AutoLockScheduler...");
        self.scheduler.run_forever().await.context("AutoLockScheduler failed")?;
        info!("AutoLockScheduler stopped");
        Ok(())
    }

    pub fn stop_scheduler(&self) {
        info!("Stopping AutoLockScheduler...");
        self.scheduler.stop();
    }

    /// Graceful shutdown of all components
    pub async fn shutdown(&self) -> Result<()> {
        info!("Initiating graceful shutdown...");
        if self.scheduler.is_running() {
            warn!("AutoLockScheduler still running at shutdown");
            self.stop_scheduler();
        }

        let metrics = self.scheduler.get_metrics();
        info!(
            "AutoLockScheduler ran {} times ({} failed), locked {} teams",
            metrics.runs, metrics.failed_runs, metrics.teams_locked
        );

        match self.store.teams().await {
            Ok(teams) => info!("{} teams on file at shutdown", teams.len()),
            Err(e) => error!("Failed to read teams at shutdown: {}", e),
        }
        Ok(())
    }
}


//! Race completion: reprice the market, then settle every team

use std::collections::HashMap;
use std::sync::Arc;

use budget_ledger::SettlementInput;
use futures::{stream, StreamExt};
use lockout_resolver::{RaceId, RaceStatus};
use pricing_engine::{fantasy_points, AssetId, PriceUpdate};
use serde::{Deserialize, Serialize};
use team_store::Store;
use tracing::{error, info, warn};

use crate::error::{Result, ServiceError};
use crate::market::Market;
use crate::teams::TeamService;

/// Teams settled at once; each settlement is a load and a write
const SETTLEMENT_CONCURRENCY: usize = 16;

/// Classified finish for one asset. Constructors carry the combined result of their cars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub asset_id: AssetId,
    pub race_position: Option<u32>,
    #[serde(default)]
    pub sprint_position: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaceDayReport {
    pub race_id: Option<RaceId>,
    pub round: u32,
    pub price_updates: Vec<PriceUpdate>,
    pub teams_settled: usize,
    /// Teams that had already been credited with this round
    pub teams_skipped: usize,
    pub errors: Vec<String>,
    /// The race was already completed; nothing was done
    pub already_completed: bool,
}

impl RaceDayReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct RaceDay {
    store: Arc<dyn Store>,
    market: Arc<Market>,
    teams: Arc<TeamService>,
}

impl RaceDay {
    pub fn new(store: Arc<dyn Store>, market: Arc<Market>, teams: Arc<TeamService>) -> Self {
        Self { store, market, teams }
    }

    /// Score a finished weekend.
    ///
    /// The race is marked completed only once every team has settled, so a
    /// failed run can be repeated; repricing and settlement both skip work
    /// already done for the round.
    pub async fn complete_race(&self, race_id: &RaceId, results: &[RaceResult]) -> Result<RaceDayReport> {
        let race = self
            .store
            .races()
            .await?
            .into_iter()
            .find(|r| &r.id == race_id)
            .ok_or_else(|| ServiceError::RaceNotFound(race_id.clone()))?;

        let mut report = RaceDayReport { race_id: Some(race.id.clone()), round: race.round, ..Default::default() };
        if race.status == RaceStatus::Completed {
            info!("{} already completed", race.name);
            report.already_completed = true;
            return Ok(report);
        }
        self.store.set_race_status(&race.id, RaceStatus::InProgress).await?;

        let points: HashMap<AssetId, f64> = results
            .iter()
            .map(|r| (r.asset_id.clone(), fantasy_points(r.race_position, r.sprint_position)))
            .collect();
        report.price_updates = self.market.apply_results(race.round, race.has_sprint, &points).await?;

        let input = SettlementInput { round: race.round, points, prices: self.market.prices().await? };
        let teams = self.store.teams().await?;
        let input = &input;
        let outcomes: Vec<_> = stream::iter(teams.iter())
            .map(|team| async move { (team, self.teams.settle(&team.id, input).await) })
            .buffer_unordered(SETTLEMENT_CONCURRENCY)
            .collect()
            .await;

        for (team, outcome) in outcomes {
            match outcome {
                Ok(settlement) if settlement.applied => report.teams_settled += 1,
                Ok(_) => report.teams_skipped += 1,
                Err(e) => {
                    error!("Failed to settle team {} for {}: {}", team.id, race.name, e);
                    report.errors.push(format!("{}: {}", team.id, e));
                }
            }
        }

        if report.is_success() {
            self.store.set_race_status(&race.id, RaceStatus::Completed).await?;
            info!(
                "Completed {}: {} prices moved, {} teams settled",
                race.name,
                report.price_updates.len(),
                report.teams_settled
            );
        } else {
            warn!("{} left in progress after {} settlement failures", race.name, report.errors.len());
        }
        metrics::counter!("economy_settlements_total", report.teams_settled as u64);
        Ok(report)
    }
}

//! Serialized per-team ledger operations
//!
//! Every mutation runs load → resolve lock → mutate → validate → save while
//! holding that team's guard, so two requests for the same team never
//! interleave. Requests for different teams run in parallel.
//!
//! The save is conditional on the revision that was loaded. Writers outside
//! this service (the auto-lock scheduler, another process on the same store)
//! make it fail, and the whole cycle reruns against the fresh document.

use std::collections::HashSet;
use std::sync::Arc;

use budget_ledger::{
    AssetHolding, BudgetLedger, FantasyTeam, LedgerError, LockSource, RaceSettlement, SaleReceipt,
    SettlementInput, SwapReceipt, TeamId,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use lockout_resolver::{
    resolve_with_policy, AdminOverride, LeagueId, LockStatus, RaceId, RaceStatus,
};
use pricing_engine::AssetId;
use team_store::{Store, StoreError};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Result, ServiceError};
use crate::market::Market;

/// Load-mutate-save cycles tried before a conflicting write is reported
const MAX_WRITE_ATTEMPTS: u32 = 3;

pub struct TeamService {
    store: Arc<dyn Store>,
    market: Arc<Market>,
    ledger: BudgetLedger,
    guards: DashMap<TeamId, Arc<Mutex<()>>>,
    /// Serializes team creation so the one-team-per-league check holds
    creation: Mutex<()>,
}

impl TeamService {
    pub fn new(store: Arc<dyn Store>, market: Arc<Market>, ledger: BudgetLedger) -> Self {
        Self { store, market, ledger, guards: DashMap::new(), creation: Mutex::new(()) }
    }

    pub fn ledger(&self) -> &BudgetLedger {
        &self.ledger
    }

    /// Create a team; an owner holds at most one team per league
    pub async fn create_team(&self, owner_id: &str, league_id: Option<LeagueId>) -> Result<FantasyTeam> {
        let _creating = self.creation.lock().await;
        if let Some(league) = &league_id {
            if let Some(existing) = self.store.find_team(owner_id, Some(league)).await? {
                info!("Owner {} already has team {} in league {}", owner_id, existing.id, league);
                return Err(
                    LedgerError::DuplicateTeam { owner_id: owner_id.to_string(), league_id: league.clone() }.into()
                );
            }
        }

        let team = self.ledger.create_team(TeamId::generate(), owner_id, league_id);
        self.store.save_team(&team).await?;
        metrics::counter!("economy_teams_created_total", 1);
        info!("Created team {} for owner {}", team.id, owner_id);
        Ok(team)
    }

    pub async fn team(&self, team_id: &TeamId) -> Result<FantasyTeam> {
        self.store.load_team(team_id).await?.ok_or_else(|| ServiceError::TeamNotFound(team_id.clone()))
    }

    /// Lock status for a team right now, under its league's policy
    pub async fn lock_status(&self, team_id: &TeamId) -> Result<LockStatus> {
        let team = self.team(team_id).await?;
        self.resolve_for(&team, Utc::now()).await
    }

    pub async fn purchase(
        &self,
        team_id: &TeamId,
        asset_id: &AssetId,
        contract_length: Option<u32>,
    ) -> Result<AssetHolding> {
        let asset = self.market.asset(asset_id).await?;
        let holding = self
            .mutate(team_id, |ledger, team, ctx| ledger.purchase(team, &asset, contract_length, ctx.round))
            .await?;
        metrics::counter!("economy_trades_total", 1, "kind" => "purchase");
        Ok(holding)
    }

    pub async fn sell(&self, team_id: &TeamId, asset_id: &AssetId, bank_points: bool) -> Result<SaleReceipt> {
        let receipt = self.mutate(team_id, |ledger, team, _| ledger.sell(team, asset_id, bank_points)).await?;
        metrics::counter!("economy_trades_total", 1, "kind" => "sale");
        Ok(receipt)
    }

    pub async fn swap(
        &self,
        team_id: &TeamId,
        old_asset_id: &AssetId,
        new_asset_id: &AssetId,
        contract_length: Option<u32>,
    ) -> Result<SwapReceipt> {
        let asset = self.market.asset(new_asset_id).await?;
        let receipt = self
            .mutate(team_id, |ledger, team, ctx| {
                ledger.swap(team, old_asset_id, &asset, contract_length, ctx.round)
            })
            .await?;
        metrics::counter!("economy_trades_total", 1, "kind" => "swap");
        Ok(receipt)
    }

    /// Move the star to `asset_id`. Returns the previous star.
    pub async fn assign_star(&self, team_id: &TeamId, asset_id: &AssetId) -> Result<Option<AssetId>> {
        let eligible: HashSet<AssetId> = self.market.star_eligible().await?;
        self.mutate(team_id, |ledger, team, ctx| {
            ledger.assign_star(team, asset_id, &eligible, ctx.status.captain_locked)
        })
        .await
    }

    pub async fn season_lock(&self, team_id: &TeamId, races: u32) -> Result<()> {
        self.mutate(team_id, |ledger, team, ctx| ledger.season_lock(team, races, ctx.round, ctx.now)).await
    }

    /// Leave a season lock early. Returns the fee charged.
    pub async fn early_unlock(&self, team_id: &TeamId) -> Result<i64> {
        let fee = self.mutate(team_id, |ledger, team, ctx| ledger.early_unlock(team, ctx.now)).await?;
        metrics::counter!("economy_early_unlock_fees_total", fee as u64);
        Ok(fee)
    }

    pub async fn admin_lock(&self, team_id: &TeamId, reason: &str) -> Result<()> {
        self.mutate(team_id, |ledger, team, ctx| {
            ledger.lock_team(team, reason, ctx.now);
            Ok(())
        })
        .await
    }

    /// Hold the roster open, race window or not, until the override is cleared
    pub async fn admin_unlock(&self, team_id: &TeamId) -> Result<()> {
        self.mutate(team_id, |ledger, team, ctx| {
            ledger.unlock_team(team, ctx.now);
            Ok(())
        })
        .await
    }

    /// Hand the team back to the race calendar. Returns whether an admin
    /// lock or unlock was in place.
    pub async fn admin_clear_override(&self, team_id: &TeamId) -> Result<bool> {
        self.mutate(team_id, |ledger, team, ctx| Ok(ledger.clear_admin_override(team, ctx.now))).await
    }

    /// Credit a completed race to one team
    pub async fn settle(&self, team_id: &TeamId, input: &SettlementInput) -> Result<RaceSettlement> {
        let guard = self.guard(team_id);
        let _held = guard.lock().await;

        let mut attempt = 1;
        loop {
            let mut team = self.team(team_id).await?;
            let settlement = self.ledger.settle_race(&mut team, input)?;
            if !settlement.applied {
                return Ok(settlement);
            }
            if self.write(&team, attempt).await? {
                return Ok(settlement);
            }
            attempt += 1;
        }
    }

    fn guard(&self, team_id: &TeamId) -> Arc<Mutex<()>> {
        self.guards.entry(team_id.clone()).or_default().clone()
    }

    async fn resolve_for(&self, team: &FantasyTeam, now: DateTime<Utc>) -> Result<LockStatus> {
        let races = self.store.races().await?;
        let completed: HashSet<RaceId> =
            races.iter().filter(|r| r.status == RaceStatus::Completed).map(|r| r.id.clone()).collect();

        let policy = match &team.league_id {
            Some(league) => self
                .store
                .lock_policies(std::slice::from_ref(league))
                .await?
                .remove(league)
                .unwrap_or_default(),
            None => Default::default(),
        };
        let admin_override = match team.lock.source {
            Some(LockSource::Admin) if team.lock.is_locked => Some(AdminOverride::Locked),
            Some(LockSource::Admin) => Some(AdminOverride::Unlocked),
            _ => None,
        };

        Ok(resolve_with_policy(&races, &completed, now, admin_override, policy))
    }

    async fn mutate<T>(
        &self,
        team_id: &TeamId,
        op: impl Fn(&BudgetLedger, &mut FantasyTeam, &MutationContext) -> std::result::Result<T, LedgerError>,
    ) -> Result<T> {
        let guard = self.guard(team_id);
        let _held = guard.lock().await;

        let mut attempt = 1;
        loop {
            let now = Utc::now();
            let mut team = self.team(team_id).await?;
            let status = self.resolve_for(&team, now).await?;
            self.ledger.apply_lock_status(&mut team, &status, now);

            let round = match &status.next_race {
                Some(race) => race.round,
                None => {
                    let races = self.store.races().await?;
                    races.iter().map(|r| r.round).max().unwrap_or(0) + 1
                }
            };
            let ctx = MutationContext { now, round, status };

            let outcome = op(&self.ledger, &mut team, &ctx)?;
            if self.write(&team, attempt).await? {
                return Ok(outcome);
            }
            attempt += 1;
        }
    }

    /// Conditional save. `Ok(false)` means the team moved on since it was
    /// loaded and the caller should start over.
    async fn write(&self, team: &FantasyTeam, attempt: u32) -> Result<bool> {
        match self.store.update_team(team).await {
            Ok(()) => Ok(true),
            Err(StoreError::Conflict { expected, found, .. }) if attempt < MAX_WRITE_ATTEMPTS => {
                debug!(
                    "Team {} changed from revision {} to {} during attempt {}, retrying",
                    team.id, expected, found, attempt
                );
                metrics::counter!("economy_write_conflicts_total", 1);
                Ok(false)
            }
            Err(e) => {
                if matches!(e, StoreError::Conflict { .. }) {
                    warn!("Giving up on team {} after {} conflicting writes", team.id, attempt);
                }
                Err(e.into())
            }
        }
    }
}

/// What a mutation sees besides the team itself
struct MutationContext {
    now: DateTime<Utc>,
    /// Round of the next race; holdings bought now start counting from it
    round: u32,
    status: LockStatus,
}

//! BudgetLedger implementation

use chrono::{DateTime, Utc};
use lockout_resolver::{LeagueId, LockStatus};
use pricing_engine::{Asset, AssetId, AssetKind};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::holding::AssetHolding;
use crate::team::{FantasyTeam, LockSource, SeasonLock, TeamId};
use crate::validation::validate_team;
use crate::{LedgerError, Result};

/// Money returned by a sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub asset_id: AssetId,
    pub purchase_price: i64,
    /// Current price less commission, rounded down
    pub sale_value: i64,
    pub commission: i64,
    pub termination_fee: i64,
    /// Amount credited to the budget
    pub net_return: i64,
    pub banked_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub sale: SaleReceipt,
    pub acquired: AssetHolding,
}

/// Results of one race as seen by the ledger
#[derive(Debug, Clone, Default)]
pub struct SettlementInput {
    pub round: u32,
    /// Fantasy points scored per asset
    pub points: HashMap<AssetId, f64>,
    /// Post-race prices per asset
    pub prices: HashMap<AssetId, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSettlement {
    pub team_id: TeamId,
    pub round: u32,
    /// False when the round had already been settled for this team
    pub applied: bool,
    pub points_earned: f64,
    pub star_bonus: f64,
    pub season_lock_released: bool,
}

/// Bottom `count` assets of the pool by season points.
///
/// Ties break on asset id so every caller sees the same set.
pub fn star_eligible(assets: &[Asset], count: usize) -> HashSet<AssetId> {
    let mut ranked: Vec<&Asset> = assets.iter().collect();
    ranked.sort_by(|a, b| a.season_points.total_cmp(&b.season_points).then_with(|| a.id.cmp(&b.id)));
    ranked.into_iter().take(count).map(|a| a.id.clone()).collect()
}

/// Per-team economy rules
#[derive(Debug, Clone, Default)]
pub struct BudgetLedger {
    config: LedgerConfig,
}

impl BudgetLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn create_team(&self, id: TeamId, owner_id: impl Into<String>, league_id: Option<LeagueId>) -> FantasyTeam {
        FantasyTeam::new(id, owner_id, league_id, self.config.starting_budget)
    }

    /// Buy an asset at its current price
    pub fn purchase(
        &self,
        team: &mut FantasyTeam,
        asset: &Asset,
        contract_length: Option<u32>,
        current_round: u32,
    ) -> Result<AssetHolding> {
        self.commit(team, |draft| {
            ensure_modifiable(draft)?;
            self.apply_purchase(draft, asset, contract_length, current_round)
        })
    }

    /// Sell a holding back to the market
    pub fn sell(&self, team: &mut FantasyTeam, asset_id: &AssetId, bank_points: bool) -> Result<SaleReceipt> {
        self.commit(team, |draft| {
            ensure_modifiable(draft)?;
            self.apply_sale(draft, asset_id, bank_points)
        })
    }

    /// Sell one holding and buy another of the same kind as a single step.
    ///
    /// The sale proceeds count toward the purchase; if either half fails the
    /// team is left exactly as it was.
    pub fn swap(
        &self,
        team: &mut FantasyTeam,
        old_asset_id: &AssetId,
        new_asset: &Asset,
        contract_length: Option<u32>,
        current_round: u32,
    ) -> Result<SwapReceipt> {
        self.commit(team, |draft| {
            ensure_modifiable(draft)?;
            if let Some(old) = draft.holding(old_asset_id) {
                if old.kind != new_asset.kind {
                    return Err(LedgerError::KindMismatch { expected: old.kind, actual: new_asset.kind });
                }
            }
            let sale = self.apply_sale(draft, old_asset_id, true)?;
            let acquired = self.apply_purchase(draft, new_asset, contract_length, current_round)?;
            Ok(SwapReceipt { sale, acquired })
        })
    }

    /// Move the star designation to `target`. Returns the previous star, if any.
    pub fn assign_star(
        &self,
        team: &mut FantasyTeam,
        target: &AssetId,
        eligible: &HashSet<AssetId>,
        captain_locked: bool,
    ) -> Result<Option<AssetId>> {
        self.commit(team, |draft| {
            if captain_locked {
                return Err(LedgerError::CaptainLocked);
            }
            if draft.lock.is_locked && draft.lock.source == Some(LockSource::Admin) {
                return Err(LedgerError::TeamLocked { reason: lock_reason(draft) });
            }
            if !draft.holds(target) {
                return Err(LedgerError::HoldingNotFound { asset_id: target.clone() });
            }
            if !eligible.contains(target) {
                return Err(LedgerError::StarIneligible { asset_id: target.clone() });
            }

            let previous = draft.star().map(|h| h.asset_id.clone());
            for holding in draft.holdings_mut() {
                holding.is_star = &holding.asset_id == target;
            }
            info!("Team {} star moved from {:?} to {}", draft.id, previous, target);
            Ok(previous)
        })
    }

    /// Fee for breaking a running contract.
    ///
    /// Scales with the share of the term still outstanding. A holding that has
    /// not yet been through a race can be resold without a fee, so the fee
    /// jumps from 0 to its largest value after the first settled race and
    /// shrinks from there.
    pub fn early_termination_fee(&self, holding: &AssetHolding) -> i64 {
        if holding.races_held == 0 || holding.contract_elapsed() {
            return 0;
        }
        let remaining = Decimal::from(holding.remaining_races());
        let term = Decimal::from(holding.contract_length);
        let fee = Decimal::from(holding.purchase_price) * self.config.early_termination_rate * remaining / term;
        fee.floor().to_i64().unwrap_or(0)
    }

    /// Current price less commission, rounded down
    pub fn sale_value(&self, current_price: i64) -> i64 {
        let kept = Decimal::ONE - self.config.commission_rate;
        (Decimal::from(current_price) * kept).floor().to_i64().unwrap_or(0)
    }

    /// Budget plus the market value of every holding
    pub fn team_value(&self, team: &FantasyTeam) -> i64 {
        team.budget + team.holdings().map(|h| h.current_price).sum::<i64>()
    }

    /// Credit a settled race to every holding. Replaying a round is a no-op.
    pub fn settle_race(&self, team: &mut FantasyTeam, input: &SettlementInput) -> Result<RaceSettlement> {
        if team.last_settled_round.is_some_and(|round| round >= input.round) {
            debug!("Team {} already settled round {}", team.id, input.round);
            return Ok(RaceSettlement {
                team_id: team.id.clone(),
                round: input.round,
                applied: false,
                points_earned: 0.0,
                star_bonus: 0.0,
                season_lock_released: false,
            });
        }

        let bonus_rate = self.config.star_bonus.to_f64().unwrap_or(0.0);
        self.commit(team, |draft| {
            let mut points_earned = 0.0;
            let mut star_bonus = 0.0;
            for holding in draft.holdings_mut() {
                let base = input.points.get(&holding.asset_id).copied().unwrap_or(0.0);
                let bonus = if holding.is_star { base * bonus_rate } else { 0.0 };
                holding.record_race(base + bonus, input.prices.get(&holding.asset_id).copied());
                points_earned += base + bonus;
                star_bonus += bonus;
            }
            draft.total_points += points_earned;
            draft.last_settled_round = Some(input.round);

            let mut season_lock_released = false;
            if let Some(season_lock) = draft.lock.season_lock.as_mut() {
                season_lock.races_remaining = season_lock.races_remaining.saturating_sub(1);
                if season_lock.races_remaining == 0 {
                    draft.lock.season_lock = None;
                    season_lock_released = true;
                }
            }

            match draft.lock.source {
                Some(LockSource::RaceWindow) => draft.lock.clear(),
                Some(LockSource::SeasonLock) if season_lock_released => draft.lock.clear(),
                _ => {}
            }

            info!(
                "Settled round {} for team {}: {:.1} points ({:.1} star bonus)",
                input.round, draft.id, points_earned, star_bonus
            );
            Ok(RaceSettlement {
                team_id: draft.id.clone(),
                round: input.round,
                applied: true,
                points_earned,
                star_bonus,
                season_lock_released,
            })
        })
    }

    /// Sync a resolved lock status into the team's race-window lock.
    ///
    /// Season and admin locks are left alone. A race-window lock set ahead of
    /// the cutoff is only released once its unlock time has passed, or by
    /// settlement. Returns whether anything changed.
    pub fn apply_lock_status(&self, team: &mut FantasyTeam, status: &LockStatus, now: DateTime<Utc>) -> bool {
        match team.lock.source {
            Some(LockSource::SeasonLock) | Some(LockSource::Admin) => false,
            _ if status.is_locked => {
                let reason = status.lock_reason.clone().unwrap_or_else(|| "Race weekend lock".to_string());
                let changed = team.lock.lock_for_race(reason, status.race_start_time, now);
                if changed {
                    team.updated_at = now;
                }
                changed
            }
            Some(LockSource::RaceWindow) if team.lock.next_unlock_time.map_or(true, |at| now >= at) => {
                team.lock.clear();
                team.updated_at = now;
                true
            }
            _ => false,
        }
    }

    /// Admin lock
    pub fn lock_team(&self, team: &mut FantasyTeam, reason: impl Into<String>, now: DateTime<Utc>) {
        team.lock.lock_with(LockSource::Admin, reason.into(), now);
        team.updated_at = now;
        info!("Team {} locked by admin", team.id);
    }

    /// Admin unlock. Forces the roster open, even inside a race window, until
    /// the override is cleared; also drops any season lock.
    pub fn unlock_team(&self, team: &mut FantasyTeam, now: DateTime<Utc>) {
        if team.lock.season_lock.take().is_some() {
            warn!("Admin unlock on team {} discards its season lock", team.id);
        }
        team.lock.clear();
        team.lock.source = Some(LockSource::Admin);
        team.lock.lock_reason = Some("Unlocked by league admin".to_string());
        team.lock.locked_at = Some(now);
        team.updated_at = now;
        info!("Team {} unlocked by admin", team.id);
    }

    /// Drop an admin lock or unlock so the race calendar decides again.
    /// Returns whether an override was in place.
    pub fn clear_admin_override(&self, team: &mut FantasyTeam, now: DateTime<Utc>) -> bool {
        if team.lock.source != Some(LockSource::Admin) {
            return false;
        }
        team.lock.clear();
        team.updated_at = now;
        info!("Team {} admin override cleared", team.id);
        true
    }

    /// Opt into a multi-race hold
    pub fn season_lock(
        &self,
        team: &mut FantasyTeam,
        races: u32,
        current_round: u32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.commit(team, |draft| {
            if draft.lock.is_season_locked() {
                return Err(LedgerError::AlreadySeasonLocked);
            }
            if races == 0 {
                return Err(LedgerError::InvalidSeasonLock { races });
            }
            draft.lock.season_lock = Some(SeasonLock { start_round: current_round, races_remaining: races });
            draft.lock.lock_with(
                LockSource::SeasonLock,
                format!("Season lock for {} races from round {}", races, current_round),
                now,
            );
            info!("Team {} season locked for {} races", draft.id, races);
            Ok(())
        })
    }

    /// Leave a season lock early by paying the unlock fee. Returns the fee charged.
    pub fn early_unlock(&self, team: &mut FantasyTeam, now: DateTime<Utc>) -> Result<i64> {
        let fee = self.config.early_unlock_fee;
        self.commit(team, |draft| {
            if !draft.lock.is_season_locked() {
                return Err(LedgerError::NotSeasonLocked);
            }
            if fee > draft.budget {
                return Err(LedgerError::InsufficientBudget { required: fee, available: draft.budget });
            }
            draft.budget -= fee;
            draft.realized_result -= fee;
            draft.lock.season_lock = None;
            if draft.lock.source == Some(LockSource::SeasonLock) {
                draft.lock.clear();
            }
            draft.updated_at = now;
            info!("Team {} left season lock early for {}", draft.id, fee);
            Ok(fee)
        })
    }

    /// Run `op` on a copy of the team and keep the result only if it validates
    fn commit<T>(&self, team: &mut FantasyTeam, op: impl FnOnce(&mut FantasyTeam) -> Result<T>) -> Result<T> {
        let mut draft = team.clone();
        let outcome = op(&mut draft)?;
        if let Err(failure) = validate_team(&draft, &self.config) {
            warn!("Rejected mutation on team {}: {}", team.id, failure);
            return Err(failure.into());
        }
        draft.updated_at = Utc::now();
        *team = draft;
        Ok(outcome)
    }

    fn apply_purchase(
        &self,
        draft: &mut FantasyTeam,
        asset: &Asset,
        contract_length: Option<u32>,
        current_round: u32,
    ) -> Result<AssetHolding> {
        let contract_length = contract_length.unwrap_or(self.config.default_contract_length);
        if contract_length == 0 {
            return Err(LedgerError::InvalidContractLength { length: contract_length });
        }
        if draft.holds(&asset.id) {
            return Err(LedgerError::DuplicateAsset { asset_id: asset.id.clone() });
        }
        match asset.kind {
            AssetKind::Constructor => {
                if let Some(existing) = &draft.constructor {
                    return Err(LedgerError::ConstructorSlotFilled { existing: existing.asset_id.clone() });
                }
            }
            AssetKind::Driver => {
                if draft.drivers.len() >= self.config.team_size {
                    return Err(LedgerError::RosterFull { size: self.config.team_size });
                }
            }
        }
        if asset.current_price > draft.budget {
            return Err(LedgerError::InsufficientBudget {
                required: asset.current_price,
                available: draft.budget,
            });
        }

        let holding = AssetHolding::new(asset, contract_length, current_round);
        match asset.kind {
            AssetKind::Constructor => draft.constructor = Some(holding.clone()),
            AssetKind::Driver => draft.drivers.push(holding.clone()),
        }
        draft.budget -= holding.purchase_price;
        draft.total_spent += holding.purchase_price;
        if draft.is_complete(self.config.team_size) {
            draft.is_built = true;
        }

        info!(
            "Team {} bought {} for {} ({} race contract), budget now {}",
            draft.id, asset.id, holding.purchase_price, contract_length, draft.budget
        );
        Ok(holding)
    }

    fn apply_sale(&self, draft: &mut FantasyTeam, asset_id: &AssetId, bank_points: bool) -> Result<SaleReceipt> {
        let holding = draft
            .remove_holding(asset_id)
            .ok_or_else(|| LedgerError::HoldingNotFound { asset_id: asset_id.clone() })?;

        let sale_value = self.sale_value(holding.current_price);
        let termination_fee = self.early_termination_fee(&holding);
        let net_return = (sale_value - termination_fee).max(0);

        draft.budget += net_return;
        draft.total_spent -= holding.purchase_price;
        draft.realized_result += net_return - holding.purchase_price;
        let banked_points = if bank_points { holding.points_scored } else { 0.0 };
        draft.retained_points += banked_points;

        info!(
            "Team {} sold {} for {} (commission {}, termination fee {}), budget now {}",
            draft.id,
            asset_id,
            net_return,
            holding.current_price - sale_value,
            termination_fee,
            draft.budget
        );
        Ok(SaleReceipt {
            asset_id: asset_id.clone(),
            purchase_price: holding.purchase_price,
            sale_value,
            commission: holding.current_price - sale_value,
            termination_fee,
            net_return,
            banked_points,
        })
    }
}

fn ensure_modifiable(team: &FantasyTeam) -> Result<()> {
    if team.lock.blocks_edits() {
        return Err(LedgerError::TeamLocked { reason: lock_reason(team) });
    }
    Ok(())
}

fn lock_reason(team: &FantasyTeam) -> String {
    team.lock.lock_reason.clone().unwrap_or_else(|| "roster edits are closed".to_string())
}

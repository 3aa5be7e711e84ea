//! Fantasy team and lock state model

use chrono::{DateTime, Utc};
use lockout_resolver::LeagueId;
use pricing_engine::AssetId;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::holding::AssetHolding;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What put the current lock in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockSource {
    /// Race weekend cutoff; lifted when the race is settled
    RaceWindow,
    /// Opt-in multi-race hold
    SeasonLock,
    /// League admin; with `is_locked` false the admin has forced the roster open
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonLock {
    pub start_round: u32,
    pub races_remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockState {
    pub is_locked: bool,
    pub can_modify: bool,
    pub lock_reason: Option<String>,
    pub source: Option<LockSource>,
    pub locked_at: Option<DateTime<Utc>>,
    pub next_unlock_time: Option<DateTime<Utc>>,
    pub season_lock: Option<SeasonLock>,
}

impl Default for LockState {
    fn default() -> Self {
        Self {
            is_locked: false,
            can_modify: true,
            lock_reason: None,
            source: None,
            locked_at: None,
            next_unlock_time: None,
            season_lock: None,
        }
    }
}

impl LockState {
    /// Freeze the roster for a race weekend. Returns false when already locked.
    pub fn lock_for_race(
        &mut self,
        reason: impl Into<String>,
        next_unlock_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        if self.is_locked {
            return false;
        }
        self.is_locked = true;
        self.can_modify = false;
        self.lock_reason = Some(reason.into());
        self.source = Some(LockSource::RaceWindow);
        self.locked_at = Some(now);
        self.next_unlock_time = next_unlock_time;
        true
    }

    pub(crate) fn lock_with(&mut self, source: LockSource, reason: String, now: DateTime<Utc>) {
        self.is_locked = true;
        self.can_modify = false;
        self.lock_reason = Some(reason);
        self.source = Some(source);
        self.locked_at = Some(now);
        self.next_unlock_time = None;
    }

    pub(crate) fn clear(&mut self) {
        let season_lock = self.season_lock.take();
        *self = Self { season_lock, ..Self::default() };
    }

    pub fn is_season_locked(&self) -> bool {
        self.season_lock.is_some()
    }

    pub fn blocks_edits(&self) -> bool {
        self.is_locked || !self.can_modify
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FantasyTeam {
    pub id: TeamId,
    pub owner_id: String,
    pub league_id: Option<LeagueId>,
    pub drivers: Vec<AssetHolding>,
    pub constructor: Option<AssetHolding>,
    pub budget: i64,
    /// Sum of purchase prices of current holdings
    pub total_spent: i64,
    /// Net gain or loss realized by sales and fees
    pub realized_result: i64,
    pub total_points: f64,
    /// Points banked from holdings that were sold
    pub retained_points: f64,
    /// Set once the roster is first complete
    pub is_built: bool,
    pub lock: LockState,
    pub last_settled_round: Option<u32>,
    /// Bumped by the store on every conditional write
    #[serde(default)]
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FantasyTeam {
    pub fn new(id: TeamId, owner_id: impl Into<String>, league_id: Option<LeagueId>, budget: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner_id: owner_id.into(),
            league_id,
            drivers: Vec::new(),
            constructor: None,
            budget,
            total_spent: 0,
            realized_result: 0,
            total_points: 0.0,
            retained_points: 0.0,
            is_built: false,
            lock: LockState::default(),
            last_settled_round: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Drivers followed by the constructor
    pub fn holdings(&self) -> impl Iterator<Item = &AssetHolding> {
        self.drivers.iter().chain(self.constructor.iter())
    }

    pub fn holdings_mut(&mut self) -> impl Iterator<Item = &mut AssetHolding> {
        self.drivers.iter_mut().chain(self.constructor.iter_mut())
    }

    pub fn holding(&self, asset_id: &AssetId) -> Option<&AssetHolding> {
        self.holdings().find(|h| &h.asset_id == asset_id)
    }

    pub fn holds(&self, asset_id: &AssetId) -> bool {
        self.holding(asset_id).is_some()
    }

    pub fn star(&self) -> Option<&AssetHolding> {
        self.holdings().find(|h| h.is_star)
    }

    /// Take a holding off the team
    pub(crate) fn remove_holding(&mut self, asset_id: &AssetId) -> Option<AssetHolding> {
        if self.constructor.as_ref().map(|c| &c.asset_id) == Some(asset_id) {
            return self.constructor.take();
        }
        let index = self.drivers.iter().position(|h| &h.asset_id == asset_id)?;
        Some(self.drivers.remove(index))
    }

    /// Roster is complete for the given driver count
    pub fn is_complete(&self, team_size: usize) -> bool {
        self.drivers.len() == team_size && self.constructor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_lock_for_race_is_idempotent() {
        let now = Utc::now();
        let mut lock = LockState::default();
        assert!(lock.lock_for_race("Round 3 qualifying", Some(now + Duration::days(1)), now));
        assert!(!lock.lock_for_race("Round 3 qualifying", None, now));

        assert!(lock.is_locked);
        assert!(!lock.can_modify);
        assert_eq!(lock.source, Some(LockSource::RaceWindow));
        assert_eq!(lock.next_unlock_time, Some(now + Duration::days(1)));
    }

    #[test]
    fn test_clear_keeps_season_lock_record() {
        let mut lock = LockState {
            season_lock: Some(SeasonLock { start_round: 2, races_remaining: 3 }),
            ..LockState::default()
        };
        lock.lock_with(LockSource::SeasonLock, "held".to_string(), Utc::now());
        lock.clear();
        assert!(!lock.is_locked);
        assert!(lock.is_season_locked());
    }

    #[test]
    fn test_team_round_trips_through_json() {
        let team = FantasyTeam::new(TeamId::new("t1"), "owner", Some(LeagueId::new("l1")), 1000);
        let json = serde_json::to_string(&team).unwrap();
        let back: FantasyTeam = serde_json::from_str(&json).unwrap();
        assert_eq!(back, team);
    }
}

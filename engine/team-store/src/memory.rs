//! In-memory store

use budget_ledger::{FantasyTeam, LockSource, TeamId};
use lockout_resolver::{LeagueId, LeagueLockPolicy, Race, RaceId, RaceStatus};
use pricing_engine::{Asset, AssetId};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::backend::{AssetCatalog, LeagueSettings, RaceCalendar, TeamStore};
use crate::batch::WriteBatch;
use crate::error::{Result, StoreError};

#[derive(Debug, Default)]
struct State {
    teams: HashMap<TeamId, FantasyTeam>,
    policies: HashMap<LeagueId, LeagueLockPolicy>,
    races: HashMap<RaceId, Race>,
    assets: HashMap<AssetId, Asset>,
}

/// Store kept entirely in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TeamStore for InMemoryStore {
    async fn load_team(&self, team_id: &TeamId) -> Result<Option<FantasyTeam>> {
        Ok(self.state.lock().await.teams.get(team_id).cloned())
    }

    async fn save_team(&self, team: &FantasyTeam) -> Result<()> {
        self.state.lock().await.teams.insert(team.id.clone(), team.clone());
        Ok(())
    }

    async fn update_team(&self, team: &FantasyTeam) -> Result<()> {
        let mut state = self.state.lock().await;
        let stored = state
            .teams
            .get_mut(&team.id)
            .ok_or_else(|| StoreError::not_found(format!("team {}", team.id)))?;
        if stored.revision != team.revision {
            return Err(StoreError::Conflict {
                team_id: team.id.to_string(),
                expected: team.revision,
                found: stored.revision,
            });
        }
        *stored = team.clone();
        stored.revision += 1;
        Ok(())
    }

    async fn find_team(&self, owner_id: &str, league_id: Option<&LeagueId>) -> Result<Option<FantasyTeam>> {
        let state = self.state.lock().await;
        Ok(state
            .teams
            .values()
            .find(|t| t.owner_id == owner_id && t.league_id.as_ref() == league_id)
            .cloned())
    }

    async fn teams(&self) -> Result<Vec<FantasyTeam>> {
        let state = self.state.lock().await;
        let mut teams: Vec<FantasyTeam> = state.teams.values().cloned().collect();
        teams.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(teams)
    }

    async fn unlocked_teams(&self) -> Result<Vec<FantasyTeam>> {
        let mut teams = self.teams().await?;
        teams.retain(|t| !t.lock.is_locked && t.lock.source != Some(LockSource::Admin));
        Ok(teams)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<usize> {
        batch.ensure_within_limit()?;
        let mut state = self.state.lock().await;
        let mut changed = 0;
        for op in batch.ops() {
            match state.teams.get_mut(op.team_id()) {
                Some(team) => {
                    if op.apply(team) {
                        changed += 1;
                    }
                }
                None => tracing::warn!("Skipping write for missing team {}", op.team_id()),
            }
        }
        Ok(changed)
    }
}

#[async_trait::async_trait]
impl LeagueSettings for InMemoryStore {
    async fn lock_policies(&self, league_ids: &[LeagueId]) -> Result<HashMap<LeagueId, LeagueLockPolicy>> {
        let state = self.state.lock().await;
        Ok(league_ids
            .iter()
            .filter_map(|id| state.policies.get(id).map(|policy| (id.clone(), *policy)))
            .collect())
    }

    async fn set_lock_policy(&self, league_id: &LeagueId, policy: LeagueLockPolicy) -> Result<()> {
        self.state.lock().await.policies.insert(league_id.clone(), policy);
        Ok(())
    }
}

#[async_trait::async_trait]
impl RaceCalendar for InMemoryStore {
    async fn races(&self) -> Result<Vec<Race>> {
        let state = self.state.lock().await;
        let mut races: Vec<Race> = state.races.values().cloned().collect();
        races.sort_by_key(|r| r.round);
        Ok(races)
    }

    async fn save_race(&self, race: &Race) -> Result<()> {
        self.state.lock().await.races.insert(race.id.clone(), race.clone());
        Ok(())
    }

    async fn set_race_status(&self, race_id: &RaceId, status: RaceStatus) -> Result<()> {
        let mut state = self.state.lock().await;
        let race = state
            .races
            .get_mut(race_id)
            .ok_or_else(|| StoreError::not_found(format!("race {}", race_id)))?;
        race.status = status;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AssetCatalog for InMemoryStore {
    async fn assets(&self) -> Result<Vec<Asset>> {
        let state = self.state.lock().await;
        let mut assets: Vec<Asset> = state.assets.values().cloned().collect();
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(assets)
    }

    async fn load_asset(&self, asset_id: &AssetId) -> Result<Option<Asset>> {
        Ok(self.state.lock().await.assets.get(asset_id).cloned())
    }

    async fn save_assets(&self, assets: &[Asset]) -> Result<()> {
        let mut state = self.state.lock().await;
        for asset in assets {
            state.assets.insert(asset.id.clone(), asset.clone());
        }
        Ok(())
    }
}

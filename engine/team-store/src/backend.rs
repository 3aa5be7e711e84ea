//! Storage traits

use budget_ledger::{FantasyTeam, TeamId};
use lockout_resolver::{LeagueId, LeagueLockPolicy, Race, RaceId, RaceStatus};
use pricing_engine::{Asset, AssetId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::batch::WriteBatch;
use crate::config::{StoreBackend, StoreConfig};
use crate::error::Result;
use crate::file::FileStore;
use crate::memory::InMemoryStore;

/// Team documents
#[async_trait::async_trait]
pub trait TeamStore: Send + Sync {
    async fn load_team(&self, team_id: &TeamId) -> Result<Option<FantasyTeam>>;

    /// Insert or replace a whole team document
    async fn save_team(&self, team: &FantasyTeam) -> Result<()>;

    /// Replace a team only if the stored revision still matches `team.revision`.
    ///
    /// The stored copy gets the next revision. Fails with `StoreError::Conflict`
    /// when another writer got there first.
    async fn update_team(&self, team: &FantasyTeam) -> Result<()>;

    /// The team an owner holds in a league (or outside any league)
    async fn find_team(&self, owner_id: &str, league_id: Option<&LeagueId>) -> Result<Option<FantasyTeam>>;

    async fn teams(&self) -> Result<Vec<FantasyTeam>>;

    /// Teams whose roster is currently open and not held open by an admin
    async fn unlocked_teams(&self) -> Result<Vec<FantasyTeam>>;

    /// Apply a batch of field-level updates. Returns the number of documents changed.
    async fn commit(&self, batch: WriteBatch) -> Result<usize>;
}

/// Per-league lock deadline policies
#[async_trait::async_trait]
pub trait LeagueSettings: Send + Sync {
    /// Fetch policies for many leagues in one call. Leagues without a policy are absent.
    async fn lock_policies(&self, league_ids: &[LeagueId]) -> Result<HashMap<LeagueId, LeagueLockPolicy>>;

    async fn set_lock_policy(&self, league_id: &LeagueId, policy: LeagueLockPolicy) -> Result<()>;
}

#[async_trait::async_trait]
pub trait RaceCalendar: Send + Sync {
    /// Every race, ordered by round
    async fn races(&self) -> Result<Vec<Race>>;

    async fn save_race(&self, race: &Race) -> Result<()>;

    async fn set_race_status(&self, race_id: &RaceId, status: RaceStatus) -> Result<()>;
}

/// Tradeable assets and their current prices
#[async_trait::async_trait]
pub trait AssetCatalog: Send + Sync {
    async fn assets(&self) -> Result<Vec<Asset>>;

    async fn load_asset(&self, asset_id: &AssetId) -> Result<Option<Asset>>;

    async fn save_assets(&self, assets: &[Asset]) -> Result<()>;
}

/// Everything the economy needs from storage
pub trait Store: TeamStore + LeagueSettings + RaceCalendar + AssetCatalog {}

impl<T> Store for T where T: TeamStore + LeagueSettings + RaceCalendar + AssetCatalog + ?Sized {}

/// Build the store selected by `config`
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn Store>> {
    config.validate()?;
    let store: Arc<dyn Store> = match config.backend {
        StoreBackend::Memory => Arc::new(InMemoryStore::new()),
        StoreBackend::File => Arc::new(FileStore::open(config.clone()).await?),
    };
    tracing::info!("Using {:?} store", config.backend);
    Ok(store)
}

//! File-backed store
//!
//! Each team is one JSON document under `teams/`; league policies, races and
//! assets are one document each. Every write goes to a temporary file that is
//! renamed over the target, so readers never see a partial document.

use budget_ledger::{FantasyTeam, LockSource, TeamId};
use lockout_resolver::{LeagueId, LeagueLockPolicy, Race, RaceId, RaceStatus};
use pricing_engine::{Asset, AssetId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::backend::{AssetCatalog, LeagueSettings, RaceCalendar, TeamStore};
use crate::batch::WriteBatch;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};

const LEAGUES_FILE: &str = "leagues.json";
const RACES_FILE: &str = "races.json";
const ASSETS_FILE: &str = "assets.json";

pub struct FileStore {
    config: StoreConfig,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open a store rooted at `config.data_dir`, creating directories as needed
    pub async fn open(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        tokio::fs::create_dir_all(config.teams_dir()).await?;
        tracing::info!("File store opened at: {:?}", config.data_dir);
        Ok(Self { config, write_lock: Mutex::new(()) })
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    fn team_path(&self, team_id: &TeamId) -> Result<PathBuf> {
        let key = team_id.0.as_str();
        let valid = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::invalid_key(format!("team id {:?}", key)));
        }
        Ok(self.config.teams_dir().join(format!("{}.json", key)))
    }

    async fn read_teams(&self) -> Result<Vec<FantasyTeam>> {
        let mut teams = Vec::new();
        let mut entries = tokio::fs::read_dir(self.config.teams_dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(team) = read_document::<FantasyTeam>(&path).await? {
                teams.push(team);
            }
        }
        teams.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(teams)
    }

    async fn read_collection<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        Ok(read_document(&self.config.data_dir.join(name)).await?.unwrap_or_default())
    }

    async fn write_collection<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        write_document(&self.config.data_dir.join(name), value).await
    }
}

async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4()));
    tokio::fs::write(&tmp, &bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

#[async_trait::async_trait]
impl TeamStore for FileStore {
    async fn load_team(&self, team_id: &TeamId) -> Result<Option<FantasyTeam>> {
        read_document(&self.team_path(team_id)?).await
    }

    async fn save_team(&self, team: &FantasyTeam) -> Result<()> {
        let path = self.team_path(&team.id)?;
        let _guard = self.write_lock.lock().await;
        write_document(&path, team).await
    }

    async fn update_team(&self, team: &FantasyTeam) -> Result<()> {
        let path = self.team_path(&team.id)?;
        let _guard = self.write_lock.lock().await;
        let stored = read_document::<FantasyTeam>(&path)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("team {}", team.id)))?;
        if stored.revision != team.revision {
            return Err(StoreError::Conflict {
                team_id: team.id.to_string(),
                expected: team.revision,
                found: stored.revision,
            });
        }
        let mut next = team.clone();
        next.revision += 1;
        write_document(&path, &next).await
    }

    async fn find_team(&self, owner_id: &str, league_id: Option<&LeagueId>) -> Result<Option<FantasyTeam>> {
        Ok(self
            .read_teams()
            .await?
            .into_iter()
            .find(|t| t.owner_id == owner_id && t.league_id.as_ref() == league_id))
    }

    async fn teams(&self) -> Result<Vec<FantasyTeam>> {
        self.read_teams().await
    }

    async fn unlocked_teams(&self) -> Result<Vec<FantasyTeam>> {
        let mut teams = self.read_teams().await?;
        teams.retain(|t| !t.lock.is_locked && t.lock.source != Some(LockSource::Admin));
        Ok(teams)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<usize> {
        batch.ensure_within_limit()?;
        let _guard = self.write_lock.lock().await;

        let mut changed = Vec::new();
        for op in batch.ops() {
            let path = self.team_path(op.team_id())?;
            let Some(mut team) = read_document::<FantasyTeam>(&path).await? else {
                tracing::warn!("Skipping write for missing team {}", op.team_id());
                continue;
            };
            if op.apply(&mut team) {
                changed.push((path, team));
            }
        }

        for (path, team) in &changed {
            write_document(path, team).await?;
        }
        tracing::debug!("Committed batch of {} ops, {} documents changed", batch.len(), changed.len());
        Ok(changed.len())
    }
}

#[async_trait::async_trait]
impl LeagueSettings for FileStore {
    async fn lock_policies(&self, league_ids: &[LeagueId]) -> Result<HashMap<LeagueId, LeagueLockPolicy>> {
        let all: BTreeMap<LeagueId, LeagueLockPolicy> = self.read_collection(LEAGUES_FILE).await?;
        Ok(league_ids
            .iter()
            .filter_map(|id| all.get(id).map(|policy| (id.clone(), *policy)))
            .collect())
    }

    async fn set_lock_policy(&self, league_id: &LeagueId, policy: LeagueLockPolicy) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut all: BTreeMap<LeagueId, LeagueLockPolicy> = self.read_collection(LEAGUES_FILE).await?;
        all.insert(league_id.clone(), policy);
        self.write_collection(LEAGUES_FILE, &all).await
    }
}

#[async_trait::async_trait]
impl RaceCalendar for FileStore {
    async fn races(&self) -> Result<Vec<Race>> {
        let mut races: Vec<Race> = self.read_collection(RACES_FILE).await?;
        races.sort_by_key(|r| r.round);
        Ok(races)
    }

    async fn save_race(&self, race: &Race) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut races: Vec<Race> = self.read_collection(RACES_FILE).await?;
        races.retain(|r| r.id != race.id);
        races.push(race.clone());
        races.sort_by_key(|r| r.round);
        self.write_collection(RACES_FILE, &races).await
    }

    async fn set_race_status(&self, race_id: &RaceId, status: RaceStatus) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut races: Vec<Race> = self.read_collection(RACES_FILE).await?;
        let race = races
            .iter_mut()
            .find(|r| &r.id == race_id)
            .ok_or_else(|| StoreError::not_found(format!("race {}", race_id)))?;
        race.status = status;
        self.write_collection(RACES_FILE, &races).await
    }
}

#[async_trait::async_trait]
impl AssetCatalog for FileStore {
    async fn assets(&self) -> Result<Vec<Asset>> {
        let assets: BTreeMap<AssetId, Asset> = self.read_collection(ASSETS_FILE).await?;
        Ok(assets.into_values().collect())
    }

    async fn load_asset(&self, asset_id: &AssetId) -> Result<Option<Asset>> {
        let mut assets: BTreeMap<AssetId, Asset> = self.read_collection(ASSETS_FILE).await?;
        Ok(assets.remove(asset_id))
    }

    async fn save_assets(&self, assets: &[Asset]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut all: BTreeMap<AssetId, Asset> = self.read_collection(ASSETS_FILE).await?;
        for asset in assets {
            all.insert(asset.id.clone(), asset.clone());
        }
        self.write_collection(ASSETS_FILE, &all).await
    }
}

//! Startup data: race calendar, asset listings and league lock policies

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use lockout_resolver::{LeagueId, LeagueLockPolicy, Race, RaceId, RaceStatus};
use serde::{Deserialize, Serialize};
use team_store::Store;
use tracing::{debug, info};

use crate::market::Market;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub races: Vec<Race>,
    pub assets: Vec<crate::market::AssetListing>,
    pub leagues: HashMap<LeagueId, LeagueLockPolicy>,
}

impl SeedData {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read seed file {:?}", path))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid seed file {:?}", path))
    }

    /// Write the seed into the store.
    ///
    /// Races and league policies are upserted. A race already on the
    /// calendar keeps its stored status, so a restart never reopens a
    /// completed round. Assets already listed keep their current price.
    pub async fn apply(&self, store: &dyn Store, market: &Market) -> Result<()> {
        let stored: HashMap<RaceId, RaceStatus> = store
            .races()
            .await
            .context("Failed to read race calendar")?
            .into_iter()
            .map(|race| (race.id, race.status))
            .collect();
        for race in &self.races {
            let mut race = race.clone();
            if let Some(status) = stored.get(&race.id) {
                if *status != race.status {
                    debug!("Race {} keeps stored status {:?}", race.id, status);
                }
                race.status = *status;
            }
            store.save_race(&race).await.with_context(|| format!("Failed to save race {}", race.id))?;
        }
        for (league_id, policy) in &self.leagues {
            store
                .set_lock_policy(league_id, *policy)
                .await
                .with_context(|| format!("Failed to save lock policy for league {}", league_id))?;
        }
        let listed = market.list_assets(&self.assets).await.context("Failed to list assets")?;

        info!(
            "Seeded {} races, {} league policies, {} new assets",
            self.races.len(),
            self.leagues.len(),
            listed.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricing_engine::{AssetId, PriceCalculator};
    use std::sync::Arc;
    use team_store::{InMemoryStore, LeagueSettings, RaceCalendar};

    const SEED: &str = r#"{
        "races": [{
            "id": "gbr-2025",
            "round": 12,
            "name": "British Grand Prix",
            "has_sprint": false,
            "schedule": {
                "fp1": "2025-07-04T11:30:00Z",
                "fp2": "2025-07-04T15:00:00Z",
                "fp3": "2025-07-05T10:30:00Z",
                "qualifying": "2025-07-05T14:00:00Z",
                "race": "2025-07-06T14:00:00Z"
            }
        }],
        "assets": [
            {"id": "NOR", "name": "Lando Norris", "kind": "driver", "prior_season_points": 374.0},
            {"id": "MCL", "name": "McLaren", "kind": "constructor", "prior_season_points": 666.0}
        ],
        "leagues": {"office": {"lock_deadline": "at_race_start"}}
    }"#;

    #[tokio::test]
    async fn test_seed_file_applies() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, SEED).unwrap();
        let seed = SeedData::from_file(&path).unwrap();

        let store = Arc::new(InMemoryStore::new());
        let market = Market::new(store.clone(), PriceCalculator::default(), 10);
        seed.apply(store.as_ref(), &market).await.unwrap();
        seed.apply(store.as_ref(), &market).await.unwrap();

        let races = store.races().await.unwrap();
        assert_eq!(races.len(), 1);
        assert_eq!(races[0].round, 12);
        assert_eq!(market.asset(&AssetId::new("MCL")).await.unwrap().current_price, 278);

        let league = LeagueId::new("office");
        let policies = store.lock_policies(std::slice::from_ref(&league)).await.unwrap();
        assert!(!policies[&league].locks_at_qualifying());
    }

    #[tokio::test]
    async fn test_reapply_keeps_race_progress() {
        let seed: SeedData = serde_json::from_str(SEED).unwrap();
        let store = Arc::new(InMemoryStore::new());
        let market = Market::new(store.clone(), PriceCalculator::default(), 10);
        seed.apply(store.as_ref(), &market).await.unwrap();

        let race_id = RaceId::new("gbr-2025");
        store.set_race_status(&race_id, RaceStatus::Completed).await.unwrap();
        seed.apply(store.as_ref(), &market).await.unwrap();

        let races = store.races().await.unwrap();
        assert_eq!(races[0].status, RaceStatus::Completed);
        assert_eq!(races[0].name, "British Grand Prix");
    }

    #[test]
    fn test_missing_seed_file() {
        assert!(SeedData::from_file(Path::new("/nonexistent/seed.json")).is_err());
    }
}

//! Asset listings and repricing

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use budget_ledger::star_eligible;
use pricing_engine::{Asset, AssetId, AssetKind, PriceCalculator, PriceUpdate, PricingError, ScoredEvent};
use serde::{Deserialize, Serialize};
use team_store::Store;
use tracing::{info, warn};

use crate::error::{Result, ServiceError};

/// An asset to list, priced from last season's points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetListing {
    pub id: AssetId,
    pub name: String,
    pub kind: AssetKind,
    pub prior_season_points: f64,
}

pub struct Market {
    store: Arc<dyn Store>,
    calculator: PriceCalculator,
    star_eligible_count: usize,
}

impl Market {
    pub fn new(store: Arc<dyn Store>, calculator: PriceCalculator, star_eligible_count: usize) -> Self {
        Self { store, calculator, star_eligible_count }
    }

    /// List new assets at their opening price. Assets already on the market keep their price.
    pub async fn list_assets(&self, listings: &[AssetListing]) -> Result<Vec<PriceUpdate>> {
        let existing: HashSet<AssetId> = self.store.assets().await?.into_iter().map(|a| a.id).collect();

        let (assets, updates): (Vec<Asset>, Vec<PriceUpdate>) = listings
            .iter()
            .filter(|listing| !existing.contains(&listing.id))
            .map(|listing| {
                self.calculator.list_asset(
                    listing.id.clone(),
                    listing.name.clone(),
                    listing.kind,
                    listing.prior_season_points,
                )
            })
            .unzip();

        if !assets.is_empty() {
            self.store.save_assets(&assets).await?;
            info!("Listed {} assets", assets.len());
        }
        Ok(updates)
    }

    pub async fn asset(&self, asset_id: &AssetId) -> Result<Asset> {
        self.store
            .load_asset(asset_id)
            .await?
            .ok_or_else(|| ServiceError::AssetNotFound(asset_id.clone()))
    }

    /// Assets currently allowed to carry the star
    pub async fn star_eligible(&self) -> Result<HashSet<AssetId>> {
        let assets = self.store.assets().await?;
        Ok(star_eligible(&assets, self.star_eligible_count))
    }

    /// Reprice every asset that scored in a completed weekend.
    ///
    /// Assets that already carry this round are skipped, so replaying a
    /// weekend leaves prices alone.
    pub async fn apply_results(
        &self,
        round: u32,
        sprint_weekend: bool,
        points: &HashMap<AssetId, f64>,
    ) -> Result<Vec<PriceUpdate>> {
        let mut assets = self.store.assets().await?;
        let mut updates = Vec::new();
        let mut changed = Vec::new();

        for asset in assets.iter_mut() {
            let Some(scored) = points.get(&asset.id) else {
                continue;
            };
            match self.calculator.reprice(asset, ScoredEvent::new(round, *scored, sprint_weekend)) {
                Ok(update) => {
                    updates.push(update);
                    changed.push(asset.clone());
                }
                Err(PricingError::StaleEvent { round, latest }) => {
                    warn!("Skipping {}: round {} already priced (latest {})", asset.id, round, latest);
                }
                Err(e) => return Err(e.into()),
            }
        }

        if !changed.is_empty() {
            self.store.save_assets(&changed).await?;
        }
        metrics::counter!("economy_price_updates_total", updates.len() as u64);
        Ok(updates)
    }

    /// Current price of every asset
    pub async fn prices(&self) -> Result<HashMap<AssetId, i64>> {
        Ok(self.store.assets().await?.into_iter().map(|a| (a.id, a.current_price)).collect())
    }
}

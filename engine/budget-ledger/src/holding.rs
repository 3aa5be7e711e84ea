//! A team's stake in a single driver or constructor

use chrono::{DateTime, Utc};
use pricing_engine::{Asset, AssetId, AssetKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetHolding {
    pub asset_id: AssetId,
    pub kind: AssetKind,
    pub name: String,
    /// Price paid, fixed for the life of the holding
    pub purchase_price: i64,
    /// Latest market price seen at settlement
    pub current_price: i64,
    /// Points accrued while held, star bonus included
    pub points_scored: f64,
    /// Races settled since acquisition
    pub races_held: u32,
    pub contract_length: u32,
    /// Round the holding was bought ahead of
    pub acquired_round: u32,
    #[serde(default)]
    pub is_star: bool,
    pub acquired_at: DateTime<Utc>,
}

impl AssetHolding {
    /// Snapshot an asset at its current price
    pub fn new(asset: &Asset, contract_length: u32, acquired_round: u32) -> Self {
        Self {
            asset_id: asset.id.clone(),
            kind: asset.kind,
            name: asset.name.clone(),
            purchase_price: asset.current_price,
            current_price: asset.current_price,
            points_scored: 0.0,
            races_held: 0,
            contract_length,
            acquired_round,
            is_star: false,
            acquired_at: Utc::now(),
        }
    }

    pub fn contract_elapsed(&self) -> bool {
        self.races_held >= self.contract_length
    }

    pub fn remaining_races(&self) -> u32 {
        self.contract_length.saturating_sub(self.races_held)
    }

    /// Apply one settled race
    pub fn record_race(&mut self, points: f64, price: Option<i64>) {
        self.points_scored += points;
        self.races_held += 1;
        if let Some(price) = price {
            self.current_price = price;
        }
    }

}

//! Error types for the economy service

use budget_ledger::{LedgerError, TeamId};
use lockout_resolver::RaceId;
use pricing_engine::{AssetId, PricingError};
use team_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error("Team not found: {0}")]
    TeamNotFound(TeamId),

    #[error("Asset not found: {0}")]
    AssetNotFound(AssetId),

    #[error("Race not found: {0}")]
    RaceNotFound(RaceId),
}

impl ServiceError {
    /// Machine-readable reason, passing through ledger codes
    pub fn reason_code(&self) -> &'static str {
        match self {
            ServiceError::Ledger(e) => e.reason_code(),
            ServiceError::Store(StoreError::Conflict { .. }) => "concurrent_modification",
            ServiceError::Store(_) => "store_unavailable",
            ServiceError::Pricing(_) => "pricing_rejected",
            ServiceError::TeamNotFound(_) => "team_not_found",
            ServiceError::AssetNotFound(_) => "asset_not_found",
            ServiceError::RaceNotFound(_) => "race_not_found",
        }
    }
}

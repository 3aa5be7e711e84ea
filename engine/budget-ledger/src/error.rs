//! Error types for the budget ledger

use lockout_resolver::LeagueId;
use pricing_engine::{AssetId, AssetKind};
use thiserror::Error;

use crate::validation::ValidationFailure;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient budget: required {required}, available {available}")]
    InsufficientBudget { required: i64, available: i64 },

    #[error("Team is locked: {reason}")]
    TeamLocked { reason: String },

    #[error("Star designation is locked for this race")]
    CaptainLocked,

    #[error("Constructor slot already filled by {existing}")]
    ConstructorSlotFilled { existing: AssetId },

    #[error("Driver roster is full ({size} drivers)")]
    RosterFull { size: usize },

    #[error("Asset {asset_id} is already on the team")]
    DuplicateAsset { asset_id: AssetId },

    #[error("Holding not found: {asset_id}")]
    HoldingNotFound { asset_id: AssetId },

    #[error("Asset {asset_id} is not eligible for the star bonus")]
    StarIneligible { asset_id: AssetId },

    #[error("Contract length must be at least 1 race, got {length}")]
    InvalidContractLength { length: u32 },

    #[error("Season lock must cover at least 1 race, got {races}")]
    InvalidSeasonLock { races: u32 },

    #[error("Team is already season locked")]
    AlreadySeasonLocked,

    #[error("Team is not season locked")]
    NotSeasonLocked,

    #[error("Owner {owner_id} already has a team in league {league_id}")]
    DuplicateTeam { owner_id: String, league_id: LeagueId },

    #[error("Asset kind mismatch: expected {expected:?}, got {actual:?}")]
    KindMismatch { expected: AssetKind, actual: AssetKind },

    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl LedgerError {
    /// Machine-readable reason for callers that render or route failures
    pub fn reason_code(&self) -> &'static str {
        match self {
            LedgerError::InsufficientBudget { .. } => "insufficient_budget",
            LedgerError::TeamLocked { .. } => "team_locked",
            LedgerError::CaptainLocked => "captain_locked",
            LedgerError::ConstructorSlotFilled { .. } => "constructor_slot_filled",
            LedgerError::RosterFull { .. } => "roster_full",
            LedgerError::DuplicateAsset { .. } => "duplicate_asset",
            LedgerError::HoldingNotFound { .. } => "holding_not_found",
            LedgerError::StarIneligible { .. } => "star_ineligible",
            LedgerError::InvalidContractLength { .. } => "invalid_contract_length",
            LedgerError::InvalidSeasonLock { .. } => "invalid_season_lock",
            LedgerError::AlreadySeasonLocked => "already_season_locked",
            LedgerError::NotSeasonLocked => "not_season_locked",
            LedgerError::DuplicateTeam { .. } => "duplicate_team",
            LedgerError::KindMismatch { .. } => "kind_mismatch",
            LedgerError::Validation(_) => "validation_failed",
            LedgerError::InvalidConfig { .. } => "invalid_config",
        }
    }
}

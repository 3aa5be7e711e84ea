//! Budget Ledger - per-team economy
//!
//! This crate owns the fantasy team model and every operation that moves money
//! through it: purchases, sales with commission and early-termination fees,
//! atomic swaps, star designation, race settlement and season locks. Each
//! mutation runs against a working copy that is re-validated before it replaces
//! the team.

pub mod config;
pub mod error;
pub mod holding;
pub mod ledger;
pub mod team;
pub mod validation;

pub use config::LedgerConfig;
pub use error::LedgerError;
pub use holding::AssetHolding;
pub use ledger::{star_eligible, BudgetLedger, RaceSettlement, SaleReceipt, SettlementInput, SwapReceipt};
pub use team::{FantasyTeam, LockSource, LockState, SeasonLock, TeamId};
pub use validation::{validate_team, ValidationFailure, ValidationIssue};

// Re-export commonly used types
pub use lockout_resolver::{LeagueId, LockStatus};
pub use pricing_engine::{Asset, AssetId, AssetKind};

// Result type alias
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_team_starts_with_full_budget() {
        let ledger = BudgetLedger::new(LedgerConfig::default());
        let team = ledger.create_team(TeamId::new("t1"), "owner-1", None);
        assert_eq!(team.budget, 1000);
        assert_eq!(team.total_spent, 0);
        assert!(validate_team(&team, ledger.config()).is_ok());
    }

    #[test]
    fn test_reason_codes_are_stable() {
        let err = LedgerError::InsufficientBudget { required: 10, available: 5 };
        assert_eq!(err.reason_code(), "insufficient_budget");
    }
}

//! Team invariant checks run after every ledger mutation

use pricing_engine::{AssetId, AssetKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::config::LedgerConfig;
use crate::team::FantasyTeam;

/// One unmet team invariant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationIssue {
    BudgetMismatch { expected: i64, actual: i64 },
    NegativeBudget { budget: i64 },
    SpentMismatch { expected: i64, actual: i64 },
    RosterSize { expected: usize, actual: usize },
    MissingConstructor,
    DuplicateAsset { asset_id: AssetId },
    MisplacedAsset { asset_id: AssetId, slot: AssetKind },
    MultipleStars { count: usize },
    InvalidContractLength { asset_id: AssetId },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::BudgetMismatch { expected, actual } => {
                write!(f, "budget is {} but ledger totals give {}", actual, expected)
            }
            ValidationIssue::NegativeBudget { budget } => write!(f, "budget is negative ({})", budget),
            ValidationIssue::SpentMismatch { expected, actual } => {
                write!(f, "total spent is {} but holdings cost {}", actual, expected)
            }
            ValidationIssue::RosterSize { expected, actual } => {
                write!(f, "roster has {} drivers, expected {}", actual, expected)
            }
            ValidationIssue::MissingConstructor => write!(f, "no constructor selected"),
            ValidationIssue::DuplicateAsset { asset_id } => write!(f, "{} is held twice", asset_id),
            ValidationIssue::MisplacedAsset { asset_id, slot } => {
                write!(f, "{} sits in the {:?} slot", asset_id, slot)
            }
            ValidationIssue::MultipleStars { count } => write!(f, "{} holdings carry the star", count),
            ValidationIssue::InvalidContractLength { asset_id } => {
                write!(f, "{} has a zero-length contract", asset_id)
            }
        }
    }
}

/// Every invariant a team failed, in check order
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("Team validation failed: {}", summarize(.issues))]
pub struct ValidationFailure {
    pub issues: Vec<ValidationIssue>,
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; ")
}

/// Check a team against the ledger invariants
pub fn validate_team(team: &FantasyTeam, config: &LedgerConfig) -> Result<(), ValidationFailure> {
    let mut issues = Vec::new();

    let expected_budget = config.starting_budget - team.total_spent + team.realized_result;
    if team.budget != expected_budget {
        issues.push(ValidationIssue::BudgetMismatch { expected: expected_budget, actual: team.budget });
    }
    if team.budget < 0 {
        issues.push(ValidationIssue::NegativeBudget { budget: team.budget });
    }

    let cost: i64 = team.holdings().map(|h| h.purchase_price).sum();
    if cost != team.total_spent {
        issues.push(ValidationIssue::SpentMismatch { expected: cost, actual: team.total_spent });
    }

    if team.drivers.len() > config.team_size
        || (team.is_built && team.drivers.len() != config.team_size)
    {
        issues.push(ValidationIssue::RosterSize {
            expected: config.team_size,
            actual: team.drivers.len(),
        });
    }
    if team.is_built && team.constructor.is_none() {
        issues.push(ValidationIssue::MissingConstructor);
    }

    let mut seen = HashSet::new();
    for holding in team.holdings() {
        if !seen.insert(&holding.asset_id) {
            issues.push(ValidationIssue::DuplicateAsset { asset_id: holding.asset_id.clone() });
        }
        if holding.contract_length == 0 {
            issues.push(ValidationIssue::InvalidContractLength { asset_id: holding.asset_id.clone() });
        }
    }

    for driver in team.drivers.iter().filter(|h| h.kind != AssetKind::Driver) {
        issues.push(ValidationIssue::MisplacedAsset {
            asset_id: driver.asset_id.clone(),
            slot: AssetKind::Driver,
        });
    }
    if let Some(constructor) = team.constructor.as_ref().filter(|h| h.kind != AssetKind::Constructor) {
        issues.push(ValidationIssue::MisplacedAsset {
            asset_id: constructor.asset_id.clone(),
            slot: AssetKind::Constructor,
        });
    }

    let stars = team.holdings().filter(|h| h.is_star).count();
    if stars > 1 {
        issues.push(ValidationIssue::MultipleStars { count: stars });
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure { issues })
    }
}

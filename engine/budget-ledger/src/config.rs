//! Configuration for the budget ledger

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// Economy constants for team construction and trading
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Budget every new team starts with
    pub starting_budget: i64,

    /// Drivers on a built roster (the constructor slot is extra)
    pub team_size: usize,

    /// Fraction of current price kept by the market on every sale
    pub commission_rate: Decimal,

    /// Extra fraction of scored points earned by the star holding
    pub star_bonus: Decimal,

    /// Contract length applied when a purchase does not name one
    pub default_contract_length: u32,

    /// Fraction of purchase price charged for breaking a contract with its full term remaining
    pub early_termination_rate: Decimal,

    /// Flat fee for leaving a season lock early
    pub early_unlock_fee: i64,

    /// Size of the bottom-of-table pool the star may be picked from
    pub star_eligible_count: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            starting_budget: 1000,
            team_size: 5,
            commission_rate: Decimal::new(5, 2),
            star_bonus: Decimal::new(5, 1),
            default_contract_length: 3,
            early_termination_rate: Decimal::new(10, 2),
            early_unlock_fee: 50,
            star_eligible_count: 10,
        }
    }
}

impl LedgerConfig {
    /// Create config from environment variables, keeping defaults for unset keys
    pub fn from_env() -> Result<Self, LedgerError> {
        let mut config = Self::default();

        if let Some(budget) = env_parse("ECONOMY_STARTING_BUDGET")? {
            config.starting_budget = budget;
        }
        if let Some(size) = env_parse("ECONOMY_TEAM_SIZE")? {
            config.team_size = size;
        }
        if let Some(rate) = env_parse("ECONOMY_COMMISSION_RATE")? {
            config.commission_rate = rate;
        }
        if let Some(bonus) = env_parse("ECONOMY_STAR_BONUS")? {
            config.star_bonus = bonus;
        }
        if let Some(length) = env_parse("ECONOMY_DEFAULT_CONTRACT_LENGTH")? {
            config.default_contract_length = length;
        }
        if let Some(fee) = env_parse("ECONOMY_EARLY_UNLOCK_FEE")? {
            config.early_unlock_fee = fee;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.starting_budget < 0 {
            return Err(invalid("starting_budget must be non-negative"));
        }
        if self.team_size == 0 {
            return Err(invalid("team_size must be at least 1"));
        }
        if self.commission_rate < Decimal::ZERO || self.commission_rate >= Decimal::ONE {
            return Err(invalid("commission_rate must be in [0, 1)"));
        }
        if self.default_contract_length == 0 {
            return Err(invalid("default_contract_length must be at least 1"));
        }
        if self.early_unlock_fee < 0 {
            return Err(invalid("early_unlock_fee must be non-negative"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> LedgerError {
    LedgerError::InvalidConfig { message: message.to_string() }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, LedgerError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| LedgerError::InvalidConfig { message: format!("Invalid {}", key) }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rates() {
        let config = LedgerConfig::default();
        assert_eq!(config.commission_rate.to_string(), "0.05");
        assert_eq!(config.star_bonus.to_string(), "0.5");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_commission_rejected() {
        let config = LedgerConfig { commission_rate: Decimal::ONE, ..Default::default() };
        assert!(config.validate().is_err());
    }
}

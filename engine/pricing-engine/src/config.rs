use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};

/// Configuration for the pricing model.
///
/// Prices are whole currency units; points are fantasy points as scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Races in a season, used to turn prior-season totals into a per-race figure
    pub races_per_season: u32,

    /// Sprint weekends in a season
    pub sprints_per_season: u32,

    /// Currency units per fantasy point per race
    pub dollars_per_point: f64,

    /// Number of most-recent events that feed the rolling average
    pub window: usize,

    /// Weight applied to sprint-weekend entries in the rolling average
    pub sprint_weight: f64,

    /// Price floor
    pub min_price: i64,

    /// Price ceiling
    pub max_price: i64,

    /// Largest price move allowed from one race to the next (either direction)
    pub max_change_per_race: i64,

    /// Prices strictly above this are tier A
    pub a_threshold: i64,

    /// Prices strictly above this (and not tier A) are tier B
    pub b_threshold: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            races_per_season: 24,
            sprints_per_season: 6,
            dollars_per_point: 10.0,
            window: 5,
            sprint_weight: 0.75,
            min_price: 50,
            max_price: 500,
            max_change_per_race: 60,
            a_threshold: 240,
            b_threshold: 150,
        }
    }
}

impl PricingConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(races) = env_parse("PRICING_RACES_PER_SEASON")? {
            config.races_per_season = races;
        }
        if let Some(sprints) = env_parse("PRICING_SPRINTS_PER_SEASON")? {
            config.sprints_per_season = sprints;
        }
        if let Some(dpp) = env_parse("PRICING_DOLLARS_PER_POINT")? {
            config.dollars_per_point = dpp;
        }
        if let Some(window) = env_parse("PRICING_WINDOW")? {
            config.window = window;
        }
        if let Some(min_price) = env_parse("PRICING_MIN_PRICE")? {
            config.min_price = min_price;
        }
        if let Some(max_price) = env_parse("PRICING_MAX_PRICE")? {
            config.max_price = max_price;
        }
        if let Some(max_change) = env_parse("PRICING_MAX_CHANGE")? {
            config.max_change_per_race = max_change;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pricing functions cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.races_per_season == 0 {
            return Err(invalid("races_per_season must be at least 1"));
        }
        if self.sprints_per_season > self.races_per_season {
            return Err(invalid("sprints_per_season must not exceed races_per_season"));
        }
        if self.min_price > self.max_price {
            return Err(invalid("min_price must not exceed max_price"));
        }
        if self.max_change_per_race < 0 {
            return Err(invalid("max_change_per_race must be non-negative"));
        }
        if self.b_threshold > self.a_threshold {
            return Err(invalid("b_threshold must not exceed a_threshold"));
        }
        if !(self.sprint_weight > 0.0) {
            return Err(invalid("sprint_weight must be positive"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> PricingError {
    PricingError::InvalidConfig { message: message.to_string() }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| PricingError::InvalidConfig { message: format!("Invalid {}", key) }),
        Err(_) => Ok(None),
    }
}

//! Pricing Engine
//!
//! Converts real-world race performance into tradeable asset prices. Prices are
//! seeded from prior-season points, then recomputed once per completed race from
//! a bounded rolling average of recent fantasy points, with a capped per-race
//! delta and a coarse A/B/C tier classification.

pub mod calculator;
pub mod config;
pub mod error;
pub mod models;

pub use calculator::{fantasy_points, race_points, sprint_points, PriceCalculator};
pub use config::PricingConfig;
pub use error::{PricingError, Result};
pub use models::*;

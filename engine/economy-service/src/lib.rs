//! Fantasy Economy Service Library
//!
//! Wires the pricing engine, budget ledger, lockout resolver, team store and
//! auto-lock scheduler into one service: asset listings and repricing, team
//! operations serialized per team, race completion and the background lock job.

use anyhow::{Context, Result};
use std::path::Path;

pub mod config;
pub mod error;
pub mod logging;
pub mod market;
pub mod race_day;
pub mod seed;
pub mod service;
pub mod signals;
pub mod teams;

#[cfg(test)]
mod integration_tests;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use logging::initialize_logging;
pub use market::{AssetListing, Market};
pub use race_day::{RaceDay, RaceDayReport, RaceResult};
pub use seed::SeedData;
pub use service::ServiceState;
pub use signals::{graceful_shutdown, setup_signal_handlers};
pub use teams::TeamService;

/// Load configuration from an optional file plus environment variables
pub fn load_configuration(path: Option<&Path>) -> Result<ServiceConfig> {
    config::load_config(path).context("Failed to load service configuration")
}

//! Error types for the pricing engine

use thiserror::Error;

/// Result type for pricing operations
pub type Result<T> = std::result::Result<T, PricingError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("Points history out of order: round {newer} listed before round {older}")]
    HistoryOutOfOrder { newer: u32, older: u32 },

    #[error("Stale scoring event for round {round}: history already holds round {latest}")]
    StaleEvent { round: u32, latest: u32 },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

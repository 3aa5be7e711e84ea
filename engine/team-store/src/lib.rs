//! # Team Store
//!
//! Storage interfaces for the fantasy economy and two implementations selected
//! by injection.
//!
//! ## Architecture
//!
//! - **TeamStore**: team documents plus bounded field-level write batches
//! - **LeagueSettings**: per-league lock deadline policies, fetched in bulk
//! - **RaceCalendar**: races and their status
//! - **AssetCatalog**: tradeable assets and their current prices
//! - **InMemoryStore** / **FileStore**: implementations of all four
//!
//! ## Usage
//!
//! ```rust
//! use team_store::{create_store, StoreConfig, TeamStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = create_store(&StoreConfig::default()).await?;
//!     assert!(store.unlocked_teams().await?.is_empty());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod batch;
pub mod config;
pub mod error;
pub mod file;
pub mod memory;

pub use backend::{create_store, AssetCatalog, LeagueSettings, RaceCalendar, Store, TeamStore};
pub use batch::{WriteBatch, WriteOp, MAX_BATCH_OPS};
pub use config::{StoreBackend, StoreConfig};
pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::InMemoryStore;

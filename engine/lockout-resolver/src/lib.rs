//! Lockout Resolver
//!
//! Decides whether rosters are frozen right now. The answer is derived from the
//! race calendar, the set of completed races, the current time and an optional
//! admin override, and is recomputed on every read rather than cached.

pub mod race;
pub mod resolver;

pub use race::{LeagueId, LeagueLockPolicy, LockDeadline, Race, RaceId, RaceSchedule, RaceStatus};
pub use resolver::{
    next_race, resolve_lock_status, resolve_with_policy, AdminOverride, LockStatus,
    SEASON_COMPLETE_REASON,
};

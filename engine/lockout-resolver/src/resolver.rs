//! Lock status resolution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::race::{LeagueLockPolicy, LockDeadline, Race, RaceId};

pub const SEASON_COMPLETE_REASON: &str = "Season complete";

/// Manual override set by a league admin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminOverride {
    Locked,
    Unlocked,
}

/// Current lock state for a team or league
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStatus {
    /// Roster edits are frozen
    pub is_locked: bool,
    /// Star designation is frozen; never earlier than the general lock
    pub captain_locked: bool,
    pub lock_reason: Option<String>,
    pub lock_time: Option<DateTime<Utc>>,
    pub race_start_time: Option<DateTime<Utc>>,
    pub next_race: Option<Race>,
}

/// First race by ascending round that has not been completed
pub fn next_race<'a>(races: &'a [Race], completed: &HashSet<RaceId>) -> Option<&'a Race> {
    races
        .iter()
        .filter(|race| !completed.contains(&race.id))
        .min_by_key(|race| race.round)
}

/// Resolve the lock status under the default at-qualifying policy
pub fn resolve_lock_status(
    races: &[Race],
    completed: &HashSet<RaceId>,
    now: DateTime<Utc>,
    admin_override: Option<AdminOverride>,
) -> LockStatus {
    resolve_with_policy(races, completed, now, admin_override, LeagueLockPolicy::default())
}

/// Resolve the lock status for a league policy.
///
/// Pure and total: the same inputs always produce the same status.
pub fn resolve_with_policy(
    races: &[Race],
    completed: &HashSet<RaceId>,
    now: DateTime<Utc>,
    admin_override: Option<AdminOverride>,
    policy: LeagueLockPolicy,
) -> LockStatus {
    let computed = match next_race(races, completed) {
        None => LockStatus {
            is_locked: true,
            captain_locked: true,
            lock_reason: Some(SEASON_COMPLETE_REASON.to_string()),
            lock_time: None,
            race_start_time: None,
            next_race: None,
        },
        Some(race) => {
            let (session, lock_time) = match policy.lock_deadline {
                LockDeadline::AtQualifying => race.lock_session(),
                LockDeadline::AtRaceStart => ("the race", race.race_start()),
            };
            let race_start = race.race_start();
            let is_locked = now >= lock_time;

            LockStatus {
                is_locked,
                captain_locked: now >= race_start,
                lock_reason: is_locked
                    .then(|| format!("{} locked since {} started", race.name, session)),
                lock_time: Some(lock_time),
                race_start_time: Some(race_start),
                next_race: Some(race.clone()),
            }
        }
    };

    apply_override(computed, admin_override)
}

fn apply_override(mut status: LockStatus, admin_override: Option<AdminOverride>) -> LockStatus {
    match admin_override {
        None => {}
        Some(AdminOverride::Locked) => {
            debug!("Admin override forces lock");
            status.is_locked = true;
            status.lock_reason = Some("Locked by league admin".to_string());
        }
        Some(AdminOverride::Unlocked) => {
            debug!("Admin override forces unlock");
            status.is_locked = false;
            status.captain_locked = false;
            status.lock_reason = None;
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::{RaceSchedule, RaceStatus};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 5, 10, 30, 0).unwrap()
    }

    /// FP3 at T, qualifying at T+3h30m, race at T+1 day
    fn race(id: &str, round: u32, fp3: DateTime<Utc>) -> Race {
        Race {
            id: RaceId::new(id),
            round,
            name: format!("Round {}", round),
            has_sprint: false,
            schedule: RaceSchedule {
                fp1: fp3 - Duration::days(1),
                fp2: Some(fp3 - Duration::hours(20)),
                fp3: Some(fp3),
                sprint_qualifying: None,
                sprint: None,
                qualifying: fp3 + Duration::minutes(210),
                race: fp3 + Duration::days(1),
            },
            status: RaceStatus::Upcoming,
        }
    }

    fn calendar() -> Vec<Race> {
        vec![race("silverstone", 12, t0()), race("spa", 13, t0() + Duration::days(21))]
    }

    #[test]
    fn test_unlocked_before_fp3() {
        let status = resolve_lock_status(&calendar(), &HashSet::new(), t0() - Duration::minutes(30), None);
        assert!(!status.is_locked);
        assert!(!status.captain_locked);
        assert_eq!(status.lock_time, Some(t0()));
        assert_eq!(status.next_race.map(|r| r.round), Some(12));
    }

    #[test]
    fn test_locked_just_after_fp3_with_captain_open() {
        let status = resolve_lock_status(&calendar(), &HashSet::new(), t0() + Duration::minutes(1), None);
        assert!(status.is_locked);
        assert!(!status.captain_locked);
        assert!(status.lock_reason.unwrap().contains("FP3"));
    }

    #[test]
    fn test_captain_locked_after_race_start() {
        let race_start = t0() + Duration::days(1);
        let status = resolve_lock_status(&calendar(), &HashSet::new(), race_start + Duration::minutes(1), None);
        assert!(status.is_locked);
        assert!(status.captain_locked);
        assert_eq!(status.race_start_time, Some(race_start));
    }

    #[test]
    fn test_next_race_skips_completed_rounds_in_any_order() {
        let mut races = calendar();
        races.reverse();
        let completed: HashSet<RaceId> = [RaceId::new("silverstone")].into_iter().collect();
        let status = resolve_lock_status(&races, &completed, t0() + Duration::days(2), None);
        assert!(!status.is_locked);
        assert_eq!(status.next_race.map(|r| r.id), Some(RaceId::new("spa")));
    }

    #[test]
    fn test_season_complete() {
        let completed: HashSet<RaceId> = calendar().into_iter().map(|r| r.id).collect();
        let status = resolve_lock_status(&calendar(), &completed, t0(), None);
        assert!(status.is_locked);
        assert_eq!(status.lock_reason.as_deref(), Some(SEASON_COMPLETE_REASON));
        assert!(status.next_race.is_none());
    }

    #[test]
    fn test_admin_lock_applies_pre_season() {
        let status = resolve_lock_status(
            &calendar(),
            &HashSet::new(),
            t0() - Duration::days(60),
            Some(AdminOverride::Locked),
        );
        assert!(status.is_locked);
    }

    #[test]
    fn test_admin_unlock_applies_after_season() {
        let completed: HashSet<RaceId> = calendar().into_iter().map(|r| r.id).collect();
        let status = resolve_lock_status(&calendar(), &completed, t0(), Some(AdminOverride::Unlocked));
        assert!(!status.is_locked);
        assert!(!status.captain_locked);
        assert!(status.next_race.is_none());
    }

    #[test]
    fn test_race_start_policy_delays_lock() {
        let policy = LeagueLockPolicy::new(LockDeadline::AtRaceStart);
        let now = t0() + Duration::hours(4);
        let status = resolve_with_policy(&calendar(), &HashSet::new(), now, None, policy);
        assert!(!status.is_locked);
        assert_eq!(status.lock_time, Some(t0() + Duration::days(1)));
    }
}

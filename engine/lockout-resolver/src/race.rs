//! Race calendar and league lock policy types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RaceId(pub String);

impl RaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeagueId(pub String);

impl LeagueId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for LeagueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceStatus {
    #[default]
    Upcoming,
    InProgress,
    Completed,
}

/// Session start times for one race weekend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceSchedule {
    pub fp1: DateTime<Utc>,
    pub fp2: Option<DateTime<Utc>>,
    pub fp3: Option<DateTime<Utc>>,
    pub sprint_qualifying: Option<DateTime<Utc>>,
    pub sprint: Option<DateTime<Utc>>,
    pub qualifying: DateTime<Utc>,
    pub race: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Race {
    pub id: RaceId,
    /// Ordering key within the season
    pub round: u32,
    pub name: String,
    pub has_sprint: bool,
    pub schedule: RaceSchedule,
    #[serde(default)]
    pub status: RaceStatus,
}

impl Race {
    /// When roster edits close for this weekend.
    ///
    /// Sprint weekends close at sprint qualifying, regular weekends at FP3, and
    /// weekends missing those sessions fall back to qualifying.
    pub fn lock_time(&self) -> DateTime<Utc> {
        self.lock_session().1
    }

    /// Name and start of the session that closes roster edits
    pub fn lock_session(&self) -> (&'static str, DateTime<Utc>) {
        match (self.has_sprint, self.schedule.sprint_qualifying, self.schedule.fp3) {
            (true, Some(sprint_qualifying), _) => ("sprint qualifying", sprint_qualifying),
            (_, _, Some(fp3)) => ("FP3", fp3),
            _ => ("qualifying", self.schedule.qualifying),
        }
    }

    pub fn race_start(&self) -> DateTime<Utc> {
        self.schedule.race
    }

    pub fn qualifying_time(&self) -> DateTime<Utc> {
        self.schedule.qualifying
    }
}

/// When a league's rosters lock for a race weekend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockDeadline {
    #[default]
    AtQualifying,
    AtRaceStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeagueLockPolicy {
    pub lock_deadline: LockDeadline,
}

impl LeagueLockPolicy {
    pub fn new(lock_deadline: LockDeadline) -> Self {
        Self { lock_deadline }
    }

    pub fn locks_at_qualifying(&self) -> bool {
        self.lock_deadline == LockDeadline::AtQualifying
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn schedule() -> RaceSchedule {
        let fp1 = Utc.with_ymd_and_hms(2025, 5, 23, 11, 30, 0).unwrap();
        RaceSchedule {
            fp1,
            fp2: Some(fp1 + Duration::hours(4)),
            fp3: Some(fp1 + Duration::days(1)),
            sprint_qualifying: None,
            sprint: None,
            qualifying: fp1 + Duration::days(1) + Duration::hours(4),
            race: fp1 + Duration::days(2) + Duration::hours(2),
        }
    }

    #[test]
    fn test_regular_weekend_locks_at_fp3() {
        let race = Race {
            id: RaceId::new("monaco"),
            round: 8,
            name: "Monaco Grand Prix".to_string(),
            has_sprint: false,
            schedule: schedule(),
            status: RaceStatus::Upcoming,
        };
        assert_eq!(race.lock_session().0, "FP3");
        assert_eq!(Some(race.lock_time()), race.schedule.fp3);
    }

    #[test]
    fn test_sprint_weekend_locks_at_sprint_qualifying() {
        let mut s = schedule();
        s.fp3 = None;
        s.sprint_qualifying = Some(s.fp1 + Duration::hours(4));
        let race = Race {
            id: RaceId::new("miami"),
            round: 6,
            name: "Miami Grand Prix".to_string(),
            has_sprint: true,
            schedule: s.clone(),
            status: RaceStatus::Upcoming,
        };
        assert_eq!(Some(race.lock_time()), s.sprint_qualifying);
    }

    #[test]
    fn test_missing_sessions_fall_back_to_qualifying() {
        let mut s = schedule();
        s.fp3 = None;
        let race = Race {
            id: RaceId::new("imola"),
            round: 7,
            name: "Emilia Romagna Grand Prix".to_string(),
            has_sprint: true,
            schedule: s.clone(),
            status: RaceStatus::Upcoming,
        };
        assert_eq!(race.lock_time(), s.qualifying);
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&RaceStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let policy: LeagueLockPolicy =
            serde_json::from_str(r#"{"lock_deadline":"at_race_start"}"#).unwrap();
        assert!(!policy.locks_at_qualifying());
    }
}

//! Full service lifecycle against a file-backed store

use std::sync::Arc;

use chrono::{Duration, Utc};
use lockout_resolver::{Race, RaceId, RaceSchedule, RaceStatus};
use pricing_engine::{AssetId, AssetKind};
use team_store::{FileStore, StoreConfig, TeamStore};
use tempfile::TempDir;

use crate::market::AssetListing;
use crate::race_day::RaceResult;
use crate::seed::SeedData;
use crate::service::ServiceState;
use crate::ServiceConfig;

fn race(id: &str, round: u32, qualifying: chrono::DateTime<Utc>) -> Race {
    Race {
        id: RaceId::new(id),
        round,
        name: format!("Round {}", round),
        has_sprint: false,
        schedule: RaceSchedule {
            fp1: qualifying - Duration::hours(26),
            fp2: None,
            fp3: None,
            sprint_qualifying: None,
            sprint: None,
            qualifying,
            race: qualifying + Duration::hours(24),
        },
        status: RaceStatus::Upcoming,
    }
}

fn seed() -> SeedData {
    let now = Utc::now();
    SeedData {
        races: vec![race("r1", 1, now + Duration::minutes(30)), race("r2", 2, now + Duration::days(7))],
        assets: [("NOR", 374.0), ("PIA", 292.0), ("HUL", 41.0)]
            .iter()
            .map(|(id, points)| AssetListing {
                id: AssetId::new(*id),
                name: id.to_string(),
                kind: AssetKind::Driver,
                prior_season_points: *points,
            })
            .collect(),
        ..Default::default()
    }
}

async fn open(dir: &TempDir) -> ServiceState {
    let config = ServiceConfig { store: StoreConfig::file(dir.path()), ..Default::default() };
    let store = Arc::new(FileStore::open(config.store.clone()).await.unwrap());
    ServiceState::with_store(config, store).unwrap()
}

#[tokio::test]
async fn test_race_weekend_lifecycle() {
    let dir = TempDir::new().unwrap();
    let state = open(&dir).await;
    seed().apply(state.store.as_ref(), &state.market).await.unwrap();

    let team = state.teams.create_team("owner-1", None).await.unwrap();
    state.teams.purchase(&team.id, &AssetId::new("NOR"), None).await.unwrap();

    let run = state.scheduler.run_once(Utc::now()).await;
    assert!(run.is_success(), "{:?}", run.errors);
    assert_eq!(run.teams_locked, 1);

    let err = state.teams.purchase(&team.id, &AssetId::new("PIA"), None).await.unwrap_err();
    assert_eq!(err.reason_code(), "team_locked");

    let results = vec![
        RaceResult { asset_id: AssetId::new("NOR"), race_position: Some(2), sprint_position: None },
        RaceResult { asset_id: AssetId::new("PIA"), race_position: Some(1), sprint_position: None },
    ];
    let report = state.race_day.complete_race(&RaceId::new("r1"), &results).await.unwrap();
    assert!(report.is_success(), "{:?}", report.errors);
    assert_eq!(report.teams_settled, 1);

    let holding = state.teams.purchase(&team.id, &AssetId::new("PIA"), None).await.unwrap();
    assert_eq!(holding.acquired_round, 2);

    // everything survives a restart
    drop(state);
    let reopened = open(&dir).await;
    let saved = reopened.store.load_team(&team.id).await.unwrap().unwrap();
    assert_eq!(saved.total_points, 18.0);
    assert!(saved.holds(&AssetId::new("PIA")));
    assert!(!saved.lock.is_locked);

    let races = reopened.store.races().await.unwrap();
    assert_eq!(races[0].status, RaceStatus::Completed);
}

#[tokio::test]
async fn test_second_scheduler_pass_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let state = open(&dir).await;
    seed().apply(state.store.as_ref(), &state.market).await.unwrap();
    for owner in ["owner-1", "owner-2", "owner-3"] {
        state.teams.create_team(owner, None).await.unwrap();
    }

    let now = Utc::now();
    let first = state.scheduler.run_once(now).await;
    assert_eq!(first.writes, 3);

    // the race is in progress now, so nothing is due
    let second = state.scheduler.run_once(now).await;
    assert_eq!(second.races_considered, 0);
    assert_eq!(second.writes, 0);
    assert_eq!(state.store.unlocked_teams().await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_restart_with_seed_keeps_completed_round() {
    let dir = TempDir::new().unwrap();
    let seed = seed();
    let state = open(&dir).await;
    seed.apply(state.store.as_ref(), &state.market).await.unwrap();
    let team = state.teams.create_team("owner-1", None).await.unwrap();

    let results = vec![RaceResult { asset_id: AssetId::new("NOR"), race_position: Some(1), sprint_position: None }];
    state.race_day.complete_race(&RaceId::new("r1"), &results).await.unwrap();

    // boot again from the same seed file
    drop(state);
    let reopened = open(&dir).await;
    seed.apply(reopened.store.as_ref(), &reopened.market).await.unwrap();

    let races = reopened.store.races().await.unwrap();
    assert_eq!(races[0].status, RaceStatus::Completed);
    let status = reopened.teams.lock_status(&team.id).await.unwrap();
    assert_eq!(status.next_race.map(|r| r.round), Some(2));

    let holding = reopened.teams.purchase(&team.id, &AssetId::new("HUL"), None).await.unwrap();
    assert_eq!(holding.acquired_round, 2);
    let again = reopened.race_day.complete_race(&RaceId::new("r1"), &results).await.unwrap();
    assert!(again.already_completed);
}

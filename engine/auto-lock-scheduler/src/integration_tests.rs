//! End-to-end tests: scheduler, file-backed store and the budget ledger together

use std::sync::Arc;

use budget_ledger::{BudgetLedger, LedgerConfig, LedgerError, SettlementInput, TeamId};
use chrono::{Duration, TimeZone, Utc};
use lockout_resolver::{LeagueId, LeagueLockPolicy, LockDeadline, Race, RaceId, RaceSchedule, RaceStatus};
use pricing_engine::{Asset, AssetId, AssetKind, Tier};
use team_store::{FileStore, LeagueSettings, RaceCalendar, StoreConfig, TeamStore};
use tempfile::TempDir;

use crate::{AutoLockScheduler, RetryPolicy, SchedulerConfig};

fn sprint_weekend(qualifying: chrono::DateTime<Utc>) -> Race {
    Race {
        id: RaceId::new("miami"),
        round: 6,
        name: "Miami Grand Prix".to_string(),
        has_sprint: true,
        schedule: RaceSchedule {
            fp1: qualifying - Duration::hours(28),
            fp2: None,
            fp3: None,
            sprint_qualifying: Some(qualifying - Duration::hours(24)),
            sprint: Some(qualifying - Duration::hours(4)),
            qualifying,
            race: qualifying + Duration::hours(24),
        },
        status: RaceStatus::Upcoming,
    }
}

#[cfg(test)]
#[allow(clippy::module_inception)]
mod integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_auto_lock_blocks_trading_until_settlement() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::open(StoreConfig::file(dir.path())).await.unwrap());
        let now = Utc.with_ymd_and_hms(2025, 5, 3, 19, 30, 0).unwrap();
        store.save_race(&sprint_weekend(now + Duration::minutes(30))).await.unwrap();
        store
            .set_lock_policy(&LeagueId::new("sunday"), LeagueLockPolicy::new(LockDeadline::AtRaceStart))
            .await
            .unwrap();

        let ledger = BudgetLedger::new(LedgerConfig::default());
        let mut team = ledger.create_team(TeamId::new("owner-a-team"), "owner-a", None);
        let piastri = Asset::new(AssetId::new("PIA"), "Oscar Piastri", AssetKind::Driver, 320, Tier::A);
        ledger.purchase(&mut team, &piastri, None, 6).unwrap();
        store.save_team(&team).await.unwrap();
        let sunday = ledger.create_team(TeamId::new("owner-b-team"), "owner-b", Some(LeagueId::new("sunday")));
        store.save_team(&sunday).await.unwrap();

        let config = SchedulerConfig { retry: RetryPolicy { max_attempts: 2, backoff_ms: 1 }, ..Default::default() };
        let scheduler = AutoLockScheduler::new(store.clone(), config).unwrap();
        let report = scheduler.run_once(now).await;
        assert!(report.is_success(), "{:?}", report.errors);
        assert_eq!(report.writes, 1);

        // the locked document is what a fresh process sees
        let reopened = FileStore::open(StoreConfig::file(dir.path())).await.unwrap();
        let mut locked = reopened.load_team(&team.id).await.unwrap().unwrap();
        assert!(locked.lock.is_locked);
        assert_eq!(reopened.races().await.unwrap()[0].status, RaceStatus::InProgress);
        assert!(!reopened.load_team(&sunday.id).await.unwrap().unwrap().lock.is_locked);

        let err = ledger.sell(&mut locked, &piastri.id, true).unwrap_err();
        assert!(matches!(err, LedgerError::TeamLocked { .. }));

        let input = SettlementInput {
            round: 6,
            points: [(piastri.id.clone(), 33.0)].into_iter().collect(),
            prices: [(piastri.id.clone(), 345)].into_iter().collect(),
        };
        ledger.settle_race(&mut locked, &input).unwrap();
        assert!(!locked.lock.is_locked);
        let receipt = ledger.sell(&mut locked, &piastri.id, true).unwrap();
        assert_eq!(receipt.sale_value, 327);
        assert_eq!(receipt.banked_points, 33.0);
    }
}

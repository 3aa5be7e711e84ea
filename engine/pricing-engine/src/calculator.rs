use crate::config::PricingConfig;
use crate::error::Result;
use crate::models::*;
use tracing::{debug, info};

/// Grand prix points for positions 1 through 10
pub const RACE_POINTS: [u32; 10] = [25, 18, 15, 12, 10, 8, 6, 4, 2, 1];

/// Sprint points for positions 1 through 8
pub const SPRINT_POINTS: [u32; 8] = [8, 7, 6, 5, 4, 3, 2, 1];

/// Points for a grand prix finishing position; 0 outside the points
pub fn race_points(position: u32) -> u32 {
    lookup(&RACE_POINTS, position)
}

/// Points for a sprint finishing position; 0 outside the points
pub fn sprint_points(position: u32) -> u32 {
    lookup(&SPRINT_POINTS, position)
}

/// Fantasy points for a weekend: grand prix result plus optional sprint result
pub fn fantasy_points(race_position: Option<u32>, sprint_position: Option<u32>) -> f64 {
    let race = race_position.map(race_points).unwrap_or(0);
    let sprint = sprint_position.map(sprint_points).unwrap_or(0);
    f64::from(race + sprint)
}

fn lookup(table: &[u32], position: u32) -> u32 {
    position
        .checked_sub(1)
        .and_then(|index| table.get(index as usize))
        .copied()
        .unwrap_or(0)
}

/// Price calculator for the asset market
#[derive(Debug, Clone)]
pub struct PriceCalculator {
    config: PricingConfig,
}

impl Default for PriceCalculator {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

impl PriceCalculator {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Opening price from the prior season's points total
    pub fn initial_price(&self, prior_season_points: f64) -> i64 {
        let per_race = prior_season_points / f64::from(self.config.races_per_season.max(1));
        self.clamp_price((self.config.dollars_per_point * per_race).round())
    }

    /// Weighted mean of the first `window` entries of `recent_points`.
    ///
    /// Callers pass points most recent first. An entry counts 1.0, or
    /// `sprint_weight` when the matching flag marks a sprint weekend. Missing
    /// flags count as non-sprint.
    pub fn rolling_average(&self, recent_points: &[f64], sprint_flags: Option<&[bool]>) -> f64 {
        let (weighted_sum, total_weight) = recent_points
            .iter()
            .take(self.config.window)
            .enumerate()
            .fold((0.0, 0.0), |(sum, weights), (i, points)| {
                let sprint = sprint_flags.and_then(|flags| flags.get(i)).copied().unwrap_or(false);
                let weight = if sprint { self.config.sprint_weight } else { 1.0 };
                (sum + points * weight, weights + weight)
            });

        if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            0.0
        }
    }

    /// Rolling average over an ordered history
    pub fn history_average(&self, history: &PointsHistory) -> f64 {
        let points = history.points();
        let flags = history.sprint_flags();
        self.rolling_average(&points, Some(flags.as_slice()))
    }

    /// Price implied by a rolling average
    pub fn price_from_rolling_avg(&self, avg: f64) -> i64 {
        self.clamp_price(avg * self.config.dollars_per_point)
    }

    /// `new - old`, capped to the per-race limit in either direction
    pub fn price_change(&self, old: i64, new: i64) -> i64 {
        let cap = self.config.max_change_per_race;
        (new - old).clamp(-cap, cap)
    }

    /// Tier for a price; boundary values fall to the lower tier
    pub fn tier(&self, price: i64) -> Tier {
        if price > self.config.a_threshold {
            Tier::A
        } else if price > self.config.b_threshold {
            Tier::B
        } else {
            Tier::C
        }
    }

    /// List a new asset at its opening price
    pub fn list_asset(
        &self,
        id: AssetId,
        name: impl Into<String>,
        kind: AssetKind,
        prior_season_points: f64,
    ) -> (Asset, PriceUpdate) {
        let price = self.initial_price(prior_season_points);
        let tier = self.tier(price);
        let asset = Asset::new(id.clone(), name, kind, price, tier);

        debug!("Listed asset {} at {} (tier {}, prior points {:.1})", id, price, tier, prior_season_points);

        let update = PriceUpdate {
            asset_id: id,
            old_price: price,
            new_price: price,
            target_price: price,
            delta: 0,
            rolling_average: 0.0,
            tier,
            reason: PricingReason::Initial { prior_season_points },
        };
        (asset, update)
    }

    /// Record a completed weekend and move the asset's price toward its new target.
    ///
    /// The asset is left untouched when the event is not newer than its history.
    pub fn reprice(&self, asset: &mut Asset, event: ScoredEvent) -> Result<PriceUpdate> {
        asset.history.record(event)?;
        asset.season_points += event.points;

        let rolling_average = self.history_average(&asset.history);
        let target_price = self.price_from_rolling_avg(rolling_average);
        let old_price = asset.current_price;
        let step = self.price_change(old_price, target_price);
        let new_price = self.clamp_price((old_price + step) as f64);
        let tier = self.tier(new_price);

        asset.previous_price = old_price;
        asset.current_price = new_price;
        asset.tier = tier;

        info!(
            "Repriced {} after round {}: {} -> {} (target {}, avg {:.2}, tier {})",
            asset.id, event.round, old_price, new_price, target_price, rolling_average, tier
        );

        Ok(PriceUpdate {
            asset_id: asset.id.clone(),
            old_price,
            new_price,
            target_price,
            delta: new_price - old_price,
            rolling_average,
            tier,
            reason: PricingReason::RaceResult {
                round: event.round,
                points: event.points,
                sprint: event.sprint,
            },
        })
    }

    fn clamp_price(&self, raw: f64) -> i64 {
        if raw.is_nan() {
            return self.config.min_price;
        }
        let clamped = raw.clamp(self.config.min_price as f64, self.config.max_price as f64);
        clamped.round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PricingError;
    use proptest::prelude::*;

    fn calc() -> PriceCalculator {
        PriceCalculator::default()
    }

    #[test]
    fn test_initial_price_scales_with_prior_points() {
        // 10 per point * (480 / 24)
        assert_eq!(calc().initial_price(480.0), 200);
        assert_eq!(calc().initial_price(0.0), 50);
        assert_eq!(calc().initial_price(10_000.0), 500);
    }

    #[test]
    fn test_rolling_average_examples() {
        let c = calc();
        assert_eq!(c.rolling_average(&[], None), 0.0);
        assert_eq!(c.rolling_average(&[10.0, 15.0, 8.0, 12.0, 5.0], None), 10.0);
        assert_eq!(
            c.rolling_average(&[25.0, 18.0, 15.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0], None),
            16.0
        );
    }

    #[test]
    fn test_rolling_average_discounts_sprint_weekends() {
        let c = calc();
        let avg = c.rolling_average(&[20.0, 10.0], Some(&[true, false][..]));
        // (20 * 0.75 + 10) / 1.75
        assert!((avg - 25.0 / 1.75).abs() < 1e-9);

        // short flag slices treat the rest as regular weekends
        assert_eq!(c.rolling_average(&[10.0, 20.0], Some(&[][..])), 15.0);
    }

    #[test]
    fn test_price_from_rolling_avg_is_clamped() {
        let c = calc();
        assert_eq!(c.price_from_rolling_avg(16.0), 160);
        assert_eq!(c.price_from_rolling_avg(0.0), 50);
        assert_eq!(c.price_from_rolling_avg(99.0), 500);
    }

    #[test]
    fn test_price_change_is_capped() {
        let c = calc();
        assert_eq!(c.price_change(100, 200), 60);
        assert_eq!(c.price_change(200, 100), -60);
        assert_eq!(c.price_change(100, 130), 30);
    }

    #[test]
    fn test_tier_boundaries() {
        let c = calc();
        assert_eq!(c.tier(241), Tier::A);
        assert_eq!(c.tier(240), Tier::B);
        assert_eq!(c.tier(151), Tier::B);
        assert_eq!(c.tier(150), Tier::C);
    }

    #[test]
    fn test_points_tables() {
        assert_eq!(race_points(1), 25);
        assert_eq!(race_points(10), 1);
        assert_eq!(race_points(11), 0);
        assert_eq!(race_points(0), 0);
        assert_eq!(sprint_points(1), 8);
        assert_eq!(sprint_points(8), 1);
        assert_eq!(sprint_points(9), 0);
        assert_eq!(fantasy_points(Some(1), Some(1)), 33.0);
        assert_eq!(fantasy_points(None, Some(3)), 6.0);
    }

    #[test]
    fn test_reprice_moves_toward_target_with_cap() {
        let c = calc();
        let (mut asset, _) = c.list_asset(AssetId::new("VER"), "Verstappen", AssetKind::Driver, 240.0);
        assert_eq!(asset.current_price, 100);

        let update = c.reprice(&mut asset, ScoredEvent::new(1, 25.0, false)).unwrap();
        assert_eq!(update.target_price, 250);
        assert_eq!(update.delta, 60);
        assert_eq!(asset.current_price, 160);
        assert_eq!(asset.previous_price, 100);
        assert_eq!(asset.tier, Tier::B);
        assert_eq!(asset.season_points, 25.0);
    }

    #[test]
    fn test_reprice_rejects_replayed_round() {
        let c = calc();
        let (mut asset, _) = c.list_asset(AssetId::new("NOR"), "Norris", AssetKind::Driver, 300.0);
        c.reprice(&mut asset, ScoredEvent::new(3, 18.0, false)).unwrap();
        let price = asset.current_price;

        let err = c.reprice(&mut asset, ScoredEvent::new(3, 18.0, false)).unwrap_err();
        assert_eq!(err, PricingError::StaleEvent { round: 3, latest: 3 });
        assert_eq!(asset.current_price, price);
        assert_eq!(asset.season_points, 18.0);
    }

    proptest! {
        #[test]
        fn prop_initial_price_within_bounds(points in 0.0f64..1.0e7) {
            let price = calc().initial_price(points);
            prop_assert!((50..=500).contains(&price));
        }

        #[test]
        fn prop_price_change_within_cap(old in -10_000i64..10_000, new in -10_000i64..10_000) {
            let delta = calc().price_change(old, new);
            prop_assert!((-60..=60).contains(&delta));
        }

        #[test]
        fn prop_repriced_price_stays_bounded(points in proptest::collection::vec(0.0f64..60.0, 1..12)) {
            let c = calc();
            let (mut asset, _) = c.list_asset(AssetId::new("X"), "X", AssetKind::Driver, 200.0);
            for (round, pts) in points.iter().enumerate() {
                let before = asset.current_price;
                c.reprice(&mut asset, ScoredEvent::new(round as u32 + 1, *pts, false)).unwrap();
                prop_assert!((50..=500).contains(&asset.current_price));
                prop_assert!((asset.current_price - before).abs() <= 60);
            }
        }
    }
}

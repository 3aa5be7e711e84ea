use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PricingError, Result};

/// Identifier of a driver or constructor
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Driver,
    Constructor,
}

/// Coarse price bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    A,
    B,
    C,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
        };
        f.write_str(label)
    }
}

/// Fantasy points earned at one race weekend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredEvent {
    /// Round of the race weekend
    pub round: u32,
    pub points: f64,
    /// Whether the weekend carried a sprint
    pub sprint: bool,
}

impl ScoredEvent {
    pub fn new(round: u32, points: f64, sprint: bool) -> Self {
        Self { round, points, sprint }
    }
}

/// Per-event points history, most recent first.
///
/// Rounds are strictly descending. Both construction and deserialization reject
/// anything else, so the rolling average never sees an unordered window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ScoredEvent>", into = "Vec<ScoredEvent>")]
pub struct PointsHistory {
    events: Vec<ScoredEvent>,
}

impl PointsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from events listed most recent first
    pub fn from_events(events: Vec<ScoredEvent>) -> Result<Self> {
        if let Some(pair) = events.windows(2).find(|pair| pair[0].round <= pair[1].round) {
            return Err(PricingError::HistoryOutOfOrder {
                newer: pair[0].round,
                older: pair[1].round,
            });
        }
        Ok(Self { events })
    }

    /// Record a newer event at the front of the history
    pub fn record(&mut self, event: ScoredEvent) -> Result<()> {
        if let Some(latest) = self.events.first() {
            if event.round <= latest.round {
                return Err(PricingError::StaleEvent { round: event.round, latest: latest.round });
            }
        }
        self.events.insert(0, event);
        Ok(())
    }

    pub fn latest(&self) -> Option<&ScoredEvent> {
        self.events.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredEvent> {
        self.events.iter()
    }

    pub fn points(&self) -> Vec<f64> {
        self.events.iter().map(|e| e.points).collect()
    }

    pub fn sprint_flags(&self) -> Vec<bool> {
        self.events.iter().map(|e| e.sprint).collect()
    }

    pub fn total_points(&self) -> f64 {
        self.events.iter().map(|e| e.points).sum()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl TryFrom<Vec<ScoredEvent>> for PointsHistory {
    type Error = PricingError;

    fn try_from(events: Vec<ScoredEvent>) -> Result<Self> {
        Self::from_events(events)
    }
}

impl From<PointsHistory> for Vec<ScoredEvent> {
    fn from(history: PointsHistory) -> Self {
        history.events
    }
}

/// A tradeable driver or constructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    pub kind: AssetKind,
    pub current_price: i64,
    pub previous_price: i64,
    /// Cumulative points this season
    pub season_points: f64,
    pub history: PointsHistory,
    pub tier: Tier,
}

impl Asset {
    pub fn new(id: AssetId, name: impl Into<String>, kind: AssetKind, price: i64, tier: Tier) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            current_price: price,
            previous_price: price,
            season_points: 0.0,
            history: PointsHistory::new(),
            tier,
        }
    }
}

/// Why a price was (re)computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PricingReason {
    /// Seeded from the prior season's points
    Initial { prior_season_points: f64 },
    /// Recomputed after a completed race weekend
    RaceResult { round: u32, points: f64, sprint: bool },
}

/// Outcome of a repricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub asset_id: AssetId,
    pub old_price: i64,
    pub new_price: i64,
    /// Price the rolling average points at, before the per-race cap
    pub target_price: i64,
    pub delta: i64,
    pub rolling_average: f64,
    pub tier: Tier,
    pub reason: PricingReason,
}

//! Bounded write batches

use budget_ledger::{FantasyTeam, LockSource, TeamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Most operations a single commit may carry
pub const MAX_BATCH_OPS: usize = 499;

/// A field-level update to one team document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteOp {
    /// Close the roster for a race weekend; a no-op on a team already locked
    /// or under an admin override
    LockForRace {
        team_id: TeamId,
        reason: String,
        next_unlock_time: Option<DateTime<Utc>>,
        locked_at: DateTime<Utc>,
    },
}

impl WriteOp {
    pub fn team_id(&self) -> &TeamId {
        match self {
            WriteOp::LockForRace { team_id, .. } => team_id,
        }
    }

    /// Apply to a loaded team. Returns whether the document changed.
    pub(crate) fn apply(&self, team: &mut FantasyTeam) -> bool {
        match self {
            WriteOp::LockForRace { reason, next_unlock_time, locked_at, .. } => {
                if team.lock.source == Some(LockSource::Admin) {
                    return false;
                }
                let changed = team.lock.lock_for_race(reason.clone(), *next_unlock_time, *locked_at);
                if changed {
                    team.updated_at = *locked_at;
                    team.revision += 1;
                }
                changed
            }
        }
    }
}

/// Operations committed together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Split operations into as few full batches as possible
    pub fn chunked(ops: impl IntoIterator<Item = WriteOp>) -> Vec<WriteBatch> {
        let ops: Vec<WriteOp> = ops.into_iter().collect();
        ops.chunks(MAX_BATCH_OPS).map(|chunk| WriteBatch { ops: chunk.to_vec() }).collect()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn ensure_within_limit(&self) -> Result<()> {
        if self.ops.len() > MAX_BATCH_OPS {
            return Err(StoreError::BatchTooLarge { ops: self.ops.len(), max: MAX_BATCH_OPS });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(i: usize) -> WriteOp {
        WriteOp::LockForRace {
            team_id: TeamId::new(format!("team-{}", i)),
            reason: "Round 1 locked".to_string(),
            next_unlock_time: None,
            locked_at: Utc::now(),
        }
    }

    #[test]
    fn test_chunked_respects_limit() {
        let batches = WriteBatch::chunked((0..1000).map(op));
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![499, 499, 2]);
        assert!(WriteBatch::chunked(Vec::new()).is_empty());
    }

    #[test]
    fn test_oversized_batch_refused() {
        let batch = WriteBatch { ops: (0..=MAX_BATCH_OPS).map(op).collect() };
        let err = batch.ensure_within_limit().unwrap_err();
        assert!(matches!(err, StoreError::BatchTooLarge { ops: 500, max: 499 }));
        assert!(WriteBatch::chunked((0..MAX_BATCH_OPS).map(op))[0].ensure_within_limit().is_ok());
    }

    #[test]
    fn test_lock_for_race_applies_once() {
        let mut team = FantasyTeam::new(TeamId::new("team-0"), "owner", None, 1000);
        let lock = op(0);
        assert!(lock.apply(&mut team));
        assert!(!lock.apply(&mut team));
        assert!(team.lock.is_locked);
        assert!(!team.lock.can_modify);
        assert_eq!(team.revision, 1);
    }

    #[test]
    fn test_lock_for_race_leaves_admin_unlock_alone() {
        let mut team = FantasyTeam::new(TeamId::new("team-0"), "owner", None, 1000);
        team.lock.source = Some(LockSource::Admin);
        assert!(!op(0).apply(&mut team));
        assert!(!team.lock.is_locked);
        assert_eq!(team.revision, 0);
    }
}

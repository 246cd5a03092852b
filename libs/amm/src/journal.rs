//! Sequenced pool for ledger-hosted replay
//!
//! A ledger host feeds operations in commit order with their sequence
//! numbers. Gaps and duplicates are refused before the pool is touched; an
//! operation that fails still consumes its sequence, since the ledger
//! recorded the failed transaction.

use crate::error::{AmmError, Result};
use crate::pool_state::{OperationOutcome, PoolOperation, PoolState};
use crate::traits::{SequenceTracker, SequencedStateful, Stateful};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Pool state paired with the position in the operation journal
#[derive(Debug, Clone, Default)]
pub struct SequencedPool {
    pool: PoolState,
    tracker: SequenceTracker,
}

/// Counts produced by [`SequencedPool::replay`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub committed: u64,
    pub rejected: u64,
    pub last_sequence: u64,
}

/// One recorded operation and its position in the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub sequence: u64,
    pub operation: PoolOperation,
}

#[derive(Serialize, Deserialize)]
struct JournalSnapshot {
    last_sequence: u64,
    pool: PoolState,
}

impl SequencedPool {
    pub fn new(pool: PoolState) -> Self {
        Self {
            pool,
            tracker: SequenceTracker::new(),
        }
    }

    /// Continue a journal after `last_sequence`
    pub fn resume(pool: PoolState, last_sequence: u64) -> Self {
        let mut tracker = SequenceTracker::new();
        tracker.set_last_sequence(last_sequence);
        Self { pool, tracker }
    }

    pub fn pool(&self) -> &PoolState {
        &self.pool
    }

    pub fn next_expected(&self) -> u64 {
        self.tracker.next_expected()
    }

    /// Replay journal entries in order
    ///
    /// Stops at the first sequence gap and returns it as the error; failed
    /// operations are counted and skipped.
    pub fn replay<I>(&mut self, entries: I) -> Result<ReplaySummary>
    where
        I: IntoIterator<Item = JournalEntry>,
    {
        let mut summary = ReplaySummary::default();
        for JournalEntry {
            sequence,
            operation,
        } in entries
        {
            match self.apply_sequenced(sequence, operation) {
                Ok(_) => summary.committed += 1,
                Err(err @ AmmError::SequenceGap { .. }) => return Err(err),
                Err(err) => {
                    debug!(sequence, error = %err, "Journal entry rejected");
                    summary.rejected += 1;
                }
            }
        }
        summary.last_sequence = self.tracker.last_sequence();
        Ok(summary)
    }
}

impl Stateful for SequencedPool {
    type Event = PoolOperation;
    type Outcome = OperationOutcome;
    type Error = AmmError;

    fn apply_event(&mut self, event: Self::Event) -> Result<Self::Outcome> {
        self.pool.apply(event)
    }

    fn snapshot(&self) -> Result<Vec<u8>> {
        let snapshot = JournalSnapshot {
            last_sequence: self.tracker.last_sequence(),
            pool: self.pool.clone(),
        };
        bincode::serialize(&snapshot).map_err(|e| AmmError::Snapshot {
            reason: e.to_string(),
        })
    }

    fn restore(&mut self, snapshot: &[u8]) -> Result<()> {
        let snapshot: JournalSnapshot =
            bincode::deserialize(snapshot).map_err(|e| AmmError::Snapshot {
                reason: e.to_string(),
            })?;
        snapshot.pool.validate()?;
        self.pool = snapshot.pool;
        self.tracker.set_last_sequence(snapshot.last_sequence);
        Ok(())
    }
}

impl SequencedStateful for SequencedPool {
    fn apply_sequenced(&mut self, sequence: u64, event: Self::Event) -> Result<Self::Outcome> {
        if let Err(gap) = self.tracker.check(sequence) {
            warn!(sequence, expected = self.tracker.next_expected(), "Sequence gap in journal");
            return Err(gap);
        }
        let result = self.pool.apply(event);
        self.tracker.advance();
        result
    }

    fn last_sequence(&self) -> u64 {
        self.tracker.last_sequence()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool_state::Direction;

    fn swap(sequence: u64, amount_in: u128) -> JournalEntry {
        JournalEntry {
            sequence,
            operation: PoolOperation::Swap {
                direction: Direction::AtoB,
                amount_in,
                min_amount_out: None,
            },
        }
    }

    fn journal() -> Vec<JournalEntry> {
        vec![
            JournalEntry {
                sequence: 1,
                operation: PoolOperation::AddLiquidity {
                    amount_a: 1000,
                    amount_b: 1000,
                },
            },
            swap(2, 0),
            swap(3, 10),
        ]
    }

    #[test]
    fn test_replay_counts_rejections() {
        let mut pool = SequencedPool::default();
        let summary = pool.replay(journal()).unwrap();
        assert_eq!(
            summary,
            ReplaySummary {
                committed: 2,
                rejected: 1,
                last_sequence: 3
            }
        );
        assert_eq!(pool.pool().reserves(), (1010, 991));
    }

    #[test]
    fn test_gap_leaves_pool_untouched() {
        let mut pool = SequencedPool::default();
        pool.apply_sequenced(
            1,
            PoolOperation::AddLiquidity {
                amount_a: 500,
                amount_b: 500,
            },
        )
        .unwrap();
        let before = pool.pool().clone();
        let err = pool
            .apply_sequenced(
                3,
                PoolOperation::Swap {
                    direction: Direction::BtoA,
                    amount_in: 10,
                    min_amount_out: None,
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            AmmError::SequenceGap {
                expected: 2,
                actual: 3
            }
        );
        assert_eq!(pool.pool(), &before);
        assert_eq!(pool.last_sequence(), 1);
    }

    #[test]
    fn test_replay_stops_at_first_gap() {
        let mut pool = SequencedPool::default();
        let mut entries = journal();
        entries.push(swap(5, 10));
        entries.push(swap(4, 10));

        let err = pool.replay(entries).unwrap_err();
        assert_eq!(
            err,
            AmmError::SequenceGap {
                expected: 4,
                actual: 5
            }
        );
        assert_eq!(pool.last_sequence(), 3);
        assert_eq!(pool.pool().reserves(), (1010, 991));
    }

    #[test]
    fn test_resume_continues_numbering() {
        let mut pool = SequencedPool::resume(PoolState::default(), 7);
        assert_eq!(pool.next_expected(), 8);
        let summary = pool
            .replay(vec![JournalEntry {
                sequence: 8,
                operation: PoolOperation::AddLiquidity {
                    amount_a: 10,
                    amount_b: 10,
                },
            }])
            .unwrap();
        assert_eq!(summary.last_sequence, 8);
        assert!(pool.replay(journal()).is_err());
    }

    #[test]
    fn test_journal_entry_json_form() {
        let json = r#"{
            "sequence": 2,
            "operation": {
                "Swap": { "direction": "AtoB", "amount_in": 10, "min_amount_out": null }
            }
        }"#;
        let entry: JournalEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry, swap(2, 10));
    }

    #[test]
    fn test_snapshot_keeps_journal_position() {
        let mut pool = SequencedPool::default();
        pool.replay(journal()).unwrap();
        let bytes = pool.snapshot().unwrap();

        let mut restored = SequencedPool::default();
        restored.restore(&bytes).unwrap();
        assert_eq!(restored.last_sequence(), 3);
        assert_eq!(restored.next_expected(), 4);
        assert_eq!(restored.pool(), pool.pool());
    }
}

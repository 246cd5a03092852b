//! Shared AMM engine
//!
//! Serialises every mutation behind one write lock so the read-price-write
//! sequence of a swap or deposit is atomic with respect to all others.
//! Quotes take the read lock and always see both reserves from the same
//! committed state.

use crate::error::{AmmError, Result};
use crate::journal::{JournalEntry, ReplaySummary, SequencedPool};
use crate::pool_state::{
    Direction, LiquidityOutcome, OperationOutcome, PoolConfig, PoolOperation, PoolState,
    SwapOutcome,
};
use crate::traits::{SequencedStateful, Stateful};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Running counters for committed and rejected operations
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub swaps: u64,
    pub liquidity_adds: u64,
    pub rejected: u64,
    pub volume_a_in: u128,
    pub volume_b_in: u128,
}

impl EngineStats {
    fn record(&mut self, result: &Result<OperationOutcome>) {
        match result {
            Ok(OperationOutcome::Swap(swap)) => {
                self.swaps += 1;
                match swap.direction {
                    Direction::AtoB => {
                        self.volume_a_in = self.volume_a_in.saturating_add(swap.amount_in)
                    }
                    Direction::BtoA => {
                        self.volume_b_in = self.volume_b_in.saturating_add(swap.amount_in)
                    }
                }
            }
            Ok(OperationOutcome::AddLiquidity(_)) => self.liquidity_adds += 1,
            Ok(OperationOutcome::RemoveLiquidity { .. }) => {}
            Err(_) => self.rejected += 1,
        }
    }
}

/// Thread-safe owner of the pool
pub struct AmmEngine {
    state: RwLock<SequencedPool>,
    stats: RwLock<EngineStats>,
}

impl Default for AmmEngine {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl AmmEngine {
    /// Create an engine around an empty pool
    pub fn new(config: PoolConfig) -> Self {
        Self::from_state(PoolState::new(config))
    }

    /// Host an existing pool state (e.g. loaded from persistence)
    pub fn from_state(pool: PoolState) -> Self {
        Self {
            state: RwLock::new(SequencedPool::new(pool)),
            stats: RwLock::new(EngineStats::default()),
        }
    }

    /// Same as [`AmmEngine::from_state`] but refuses inconsistent state
    pub fn try_from_state(pool: PoolState) -> Result<Self> {
        Self::resume(pool, 0)
    }

    /// Host a persisted pool whose journal ended at `last_sequence`
    pub fn resume(pool: PoolState, last_sequence: u64) -> Result<Self> {
        pool.validate()?;
        Ok(Self {
            state: RwLock::new(SequencedPool::resume(pool, last_sequence)),
            stats: RwLock::new(EngineStats::default()),
        })
    }

    /// Consistent `(reserve_a, reserve_b)` snapshot
    pub fn reserves(&self) -> (u128, u128) {
        self.state.read().pool().reserves()
    }

    /// Full copy of the current pool state
    pub fn pool(&self) -> PoolState {
        self.state.read().pool().clone()
    }

    pub fn config(&self) -> PoolConfig {
        self.state.read().pool().config
    }

    pub fn stats(&self) -> EngineStats {
        self.stats.read().clone()
    }

    /// Output for `amount_in` at the current reserves, no side effects
    pub fn quote(&self, direction: Direction, amount_in: u128) -> Result<u128> {
        let result = self.state.read().pool().quote(direction, amount_in);
        debug!(%direction, amount_in, ?result, "Quote");
        result
    }

    /// Input required to receive `amount_out`, no side effects
    pub fn quote_input(&self, direction: Direction, amount_out: u128) -> Result<u128> {
        self.state.read().pool().quote_input(direction, amount_out)
    }

    pub fn swap(
        &self,
        direction: Direction,
        amount_in: u128,
        min_amount_out: Option<u128>,
    ) -> Result<SwapOutcome> {
        match self.execute(PoolOperation::Swap {
            direction,
            amount_in,
            min_amount_out,
        })? {
            OperationOutcome::Swap(outcome) => Ok(outcome),
            other => Err(unexpected_outcome("swap", &other)),
        }
    }

    pub fn add_liquidity(&self, amount_a: u128, amount_b: u128) -> Result<LiquidityOutcome> {
        match self.execute(PoolOperation::AddLiquidity { amount_a, amount_b })? {
            OperationOutcome::AddLiquidity(outcome) => Ok(outcome),
            other => Err(unexpected_outcome("add_liquidity", &other)),
        }
    }

    /// Always fails with `NotSupported`
    pub fn remove_liquidity(&self, shares: u128) -> Result<(u128, u128)> {
        match self.execute(PoolOperation::RemoveLiquidity { shares })? {
            OperationOutcome::RemoveLiquidity { amount_a, amount_b } => Ok((amount_a, amount_b)),
            other => Err(unexpected_outcome("remove_liquidity", &other)),
        }
    }

    /// Apply any operation as one atomic unit
    ///
    /// The operation takes the next journal sequence number, so standalone
    /// and replayed operations share one numbering.
    pub fn execute(&self, operation: PoolOperation) -> Result<OperationOutcome> {
        let result = {
            let mut state = self.state.write();
            let sequence = state.next_expected();
            state.apply_sequenced(sequence, operation.clone())
        };
        self.stats.write().record(&result);
        log_result(&operation, &result);
        result
    }

    /// Apply an operation carrying a ledger sequence number
    pub fn execute_sequenced(
        &self,
        sequence: u64,
        operation: PoolOperation,
    ) -> Result<OperationOutcome> {
        let result = {
            let mut state = self.state.write();
            state.apply_sequenced(sequence, operation.clone())
        };
        if !matches!(result, Err(AmmError::SequenceGap { .. })) {
            self.stats.write().record(&result);
        }
        log_result(&operation, &result);
        result
    }

    pub fn last_sequence(&self) -> u64 {
        self.state.read().last_sequence()
    }

    /// Pool and journal position from the same committed state
    pub fn journal_position(&self) -> (PoolState, u64) {
        let state = self.state.read();
        (state.pool().clone(), state.last_sequence())
    }

    /// Replay journal entries under one write lock
    ///
    /// Entries applied before a gap stay committed. Replayed operations are
    /// not counted in [`EngineStats`].
    pub fn replay(&self, entries: Vec<JournalEntry>) -> Result<ReplaySummary> {
        let mut state = self.state.write();
        match state.replay(entries) {
            Ok(summary) => {
                info!(
                    committed = summary.committed,
                    rejected = summary.rejected,
                    last_sequence = summary.last_sequence,
                    reserves = ?state.pool().reserves(),
                    "Journal replayed"
                );
                Ok(summary)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    last_sequence = state.last_sequence(),
                    "Journal replay stopped"
                );
                Err(err)
            }
        }
    }

    /// Binary snapshot of pool state and journal position
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        self.state.read().snapshot()
    }

    /// Replace pool state and journal position from a snapshot
    pub fn restore(&self, snapshot: &[u8]) -> Result<()> {
        let mut state = self.state.write();
        state.restore(snapshot)?;
        info!(reserves = ?state.pool().reserves(), "Pool restored from snapshot");
        Ok(())
    }
}

fn unexpected_outcome(operation: &'static str, outcome: &OperationOutcome) -> AmmError {
    AmmError::InvalidState {
        reason: format!("{} produced {:?}", operation, outcome),
    }
}

fn log_result(operation: &PoolOperation, result: &Result<OperationOutcome>) {
    match result {
        Ok(OperationOutcome::Swap(swap)) => info!(
            direction = %swap.direction,
            amount_in = swap.amount_in,
            amount_out = swap.amount_out,
            reserve_a = swap.reserve_a,
            reserve_b = swap.reserve_b,
            "Swap committed"
        ),
        Ok(OperationOutcome::AddLiquidity(deposit)) => info!(
            effective_a = deposit.effective_a,
            effective_b = deposit.effective_b,
            refund_a = deposit.refund_a,
            refund_b = deposit.refund_b,
            shares = deposit.shares_minted,
            reserve_a = deposit.reserve_a,
            reserve_b = deposit.reserve_b,
            "Liquidity added"
        ),
        Ok(OperationOutcome::RemoveLiquidity { amount_a, amount_b }) => {
            info!(amount_a, amount_b, "Liquidity removed")
        }
        Err(err) => warn!(?operation, error = %err, "Operation rejected"),
    }
}

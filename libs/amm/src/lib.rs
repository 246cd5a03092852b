//! # DuoSwap AMM Core - Two-Token Constant Product Engine
//!
//! ## Purpose
//!
//! Deterministic pricing and reserve-update engine for a single two-token
//! constant product pool. Quotes swaps, executes swaps and liquidity deposits
//! as atomic state transitions, and refuses anything that would leave the pool
//! one-sided or let a caller move the price for free. All arithmetic is
//! integer fixed point (`u128` base units, `U256` intermediates, floor
//! rounding in the pool's favour).
//!
//! ## Integration Points
//!
//! - **Callers**: wallet/contract invocation layers, the `amm_sim` simulator
//! - **Custody**: token transfers happen outside; a committed outcome tells the
//!   host what to pull in, push out and refund
//! - **Ledger hosting**: [`SequencedPool`] replays sequenced operations with gap
//!   detection and bincode snapshots
//! - **Display**: [`units`] converts base units and derives rates/composition
//!
//! ## Architecture Role
//!
//! ```text
//! caller ──quote──────────► [AmmEngine] ──read lock──► PoolState ─► PricingEngine
//!        ──swap/add/remove► [AmmEngine] ──write lock─► PoolState::apply
//!                                │                         │
//!                                ▼                         ▼
//!                          EngineStats, tracing     Outcome | AmmError
//! ```
//!
//! Pricing is pure and stateless; [`PoolState`] is the only writer of
//! reserves; [`AmmEngine`] serialises mutations and hands out consistent
//! snapshots to concurrent readers.

pub mod engine;
pub mod error;
pub mod journal;
pub mod pool_state;
pub mod pool_traits;
pub mod pricing;
pub mod traits;
pub mod units;

pub use engine::{AmmEngine, EngineStats};
pub use error::{AmmError, ErrorKind, Result};
pub use journal::{JournalEntry, ReplaySummary, SequencedPool};
pub use pool_state::{
    Direction, LiquidityOutcome, OperationOutcome, PoolConfig, PoolOperation, PoolState,
    SwapOutcome, DEFAULT_RATIO_TOLERANCE_BPS,
};
pub use pool_traits::AmmPool;
pub use pricing::{PricingEngine, BPS_DENOMINATOR, DEFAULT_FEE_BPS};
pub use traits::{SequenceTracker, SequencedStateful, Stateful};

/// Common types for AMM calculations
pub use ethers_core::types::U256;
pub use rust_decimal::Decimal;

//! # AMM Simulator
//!
//! Standalone host for the DuoSwap pool engine. Each invocation loads the
//! pool from a JSON state file, applies one command and writes the pool back.
//! No chain I/O is performed.

pub mod simulator;
pub mod state_store;

pub use simulator::{
    LiquidityReport, QuoteReport, SlippageGuard, Simulator, StatusReport, SwapReport,
};
pub use state_store::{read_journal, StateStore, StoredPool};

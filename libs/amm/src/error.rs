//! AMM error taxonomy
//!
//! Every variant carries the values that caused the rejection so a caller
//! can render an actionable message instead of a generic failure.

use crate::pool_state::Direction;
use thiserror::Error;

/// Errors returned by pricing and pool mutation operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmmError {
    #[error("Invalid amount: {field} must be greater than zero")]
    InvalidAmount { field: &'static str },

    #[error("Pool is empty: seed it with add_liquidity before pricing")]
    EmptyPool,

    #[error("Swap of {amount_in} {direction} produces zero output")]
    OutputTooSmall { direction: Direction, amount_in: u128 },

    #[error(
        "Deposit ratio mismatch: {amount_a} A with {amount_b} B, expected {expected_b} B \
         (tolerance {tolerance_bps} bps)"
    )]
    RatioMismatch {
        amount_a: u128,
        amount_b: u128,
        expected_b: u128,
        tolerance_bps: u32,
    },

    #[error("Slippage exceeded: output {amount_out} is below minimum {min_amount_out}")]
    SlippageExceeded { amount_out: u128, min_amount_out: u128 },

    #[error("Operation not supported: {operation}")]
    NotSupported { operation: &'static str },

    #[error("Invalid fee: {fee_bps} bps (must be below 10000)")]
    InvalidFee { fee_bps: u32 },

    #[error("Invalid slippage tolerance: {slippage_bps} bps (must be at most 10000)")]
    InvalidSlippage { slippage_bps: u32 },

    #[error("Insufficient liquidity: requested {requested}, reserve holds {available}")]
    InsufficientLiquidity { requested: u128, available: u128 },

    #[error("Deposit of {amount_a} A / {amount_b} B is too small to mint a share")]
    DepositTooSmall { amount_a: u128, amount_b: u128 },

    #[error("Arithmetic overflow in {operation}")]
    Overflow { operation: &'static str },

    #[error("Sequence gap detected: expected {expected}, actual {actual}")]
    SequenceGap { expected: u64, actual: u64 },

    #[error("Invalid pool state: {reason}")]
    InvalidState { reason: String },

    #[error("Snapshot error: {reason}")]
    Snapshot { reason: String },

    #[error("Invalid units '{input}': {reason}")]
    InvalidUnits { input: String, reason: &'static str },
}

/// Field-free discriminant of [`AmmError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAmount,
    EmptyPool,
    OutputTooSmall,
    RatioMismatch,
    SlippageExceeded,
    NotSupported,
    InvalidFee,
    InvalidSlippage,
    InsufficientLiquidity,
    DepositTooSmall,
    Overflow,
    SequenceGap,
    InvalidState,
    Snapshot,
    InvalidUnits,
}

impl AmmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AmmError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            AmmError::EmptyPool => ErrorKind::EmptyPool,
            AmmError::OutputTooSmall { .. } => ErrorKind::OutputTooSmall,
            AmmError::RatioMismatch { .. } => ErrorKind::RatioMismatch,
            AmmError::SlippageExceeded { .. } => ErrorKind::SlippageExceeded,
            AmmError::NotSupported { .. } => ErrorKind::NotSupported,
            AmmError::InvalidFee { .. } => ErrorKind::InvalidFee,
            AmmError::InvalidSlippage { .. } => ErrorKind::InvalidSlippage,
            AmmError::InsufficientLiquidity { .. } => ErrorKind::InsufficientLiquidity,
            AmmError::DepositTooSmall { .. } => ErrorKind::DepositTooSmall,
            AmmError::Overflow { .. } => ErrorKind::Overflow,
            AmmError::SequenceGap { .. } => ErrorKind::SequenceGap,
            AmmError::InvalidState { .. } => ErrorKind::InvalidState,
            AmmError::Snapshot { .. } => ErrorKind::Snapshot,
            AmmError::InvalidUnits { .. } => ErrorKind::InvalidUnits,
        }
    }
}

pub type Result<T> = std::result::Result<T, AmmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_values() {
        let err = AmmError::RatioMismatch {
            amount_a: 100,
            amount_b: 97,
            expected_b: 100,
            tolerance_bps: 100,
        };
        let msg = err.to_string();
        assert!(msg.contains("97"));
        assert!(msg.contains("expected 100 B (tolerance 100 bps)"));
        assert_eq!(err.kind(), ErrorKind::RatioMismatch);
    }

    #[test]
    fn test_output_too_small_names_direction() {
        let err = AmmError::OutputTooSmall {
            direction: Direction::AtoB,
            amount_in: 1,
        };
        assert_eq!(err.to_string(), "Swap of 1 A->B produces zero output");
    }
}

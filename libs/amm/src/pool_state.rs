//! Pool State
//!
//! Authoritative reserves of the two-token pool and the pure state
//! transitions that mutate them. Every mutation computes its full result
//! before writing, so a rejected operation leaves the pool untouched.

use crate::error::{AmmError, Result};
use crate::pricing::{PricingEngine, BPS_DENOMINATOR, DEFAULT_FEE_BPS};
use crate::traits::Stateful;
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default accepted deviation of a deposit from the pool ratio (100 = 1%)
pub const DEFAULT_RATIO_TOLERANCE_BPS: u32 = 100;

/// Swap direction, selecting which reserve is the input side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    AtoB,
    BtoA,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::AtoB => Direction::BtoA,
            Direction::BtoA => Direction::AtoB,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::AtoB => write!(f, "A->B"),
            Direction::BtoA => write!(f, "B->A"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a-to-b" | "atob" | "a->b" | "a" => Ok(Direction::AtoB),
            "b-to-a" | "btoa" | "b->a" | "b" => Ok(Direction::BtoA),
            other => Err(format!("unknown swap direction: {}", other)),
        }
    }
}

/// Fixed pricing parameters of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub fee_bps: u32, // Fee in basis points (30 = 0.3%)
    pub ratio_tolerance_bps: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            fee_bps: DEFAULT_FEE_BPS,
            ratio_tolerance_bps: DEFAULT_RATIO_TOLERANCE_BPS,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fee_bps >= BPS_DENOMINATOR {
            return Err(AmmError::InvalidFee {
                fee_bps: self.fee_bps,
            });
        }
        if self.ratio_tolerance_bps > BPS_DENOMINATOR {
            return Err(AmmError::InvalidState {
                reason: format!(
                    "ratio tolerance {} bps exceeds {}",
                    self.ratio_tolerance_bps, BPS_DENOMINATOR
                ),
            });
        }
        Ok(())
    }
}

/// Operations that can be applied to a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolOperation {
    Swap {
        direction: Direction,
        amount_in: u128,
        min_amount_out: Option<u128>,
    },
    AddLiquidity {
        amount_a: u128,
        amount_b: u128,
    },
    RemoveLiquidity {
        shares: u128,
    },
}

/// Result of a committed swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub direction: Direction,
    pub amount_in: u128,
    pub amount_out: u128,
    pub reserve_a: u128,
    pub reserve_b: u128,
}

/// Result of a committed liquidity deposit
///
/// `refund_*` is the part of the requested amounts the pool did not take,
/// to be returned by the custody layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityOutcome {
    pub effective_a: u128,
    pub effective_b: u128,
    pub refund_a: u128,
    pub refund_b: u128,
    pub shares_minted: u128,
    pub reserve_a: u128,
    pub reserve_b: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationOutcome {
    Swap(SwapOutcome),
    AddLiquidity(LiquidityOutcome),
    RemoveLiquidity { amount_a: u128, amount_b: u128 },
}

/// Complete state of the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub reserve_a: u128,
    pub reserve_b: u128,
    pub total_shares: u128,
    pub config: PoolConfig,
}

impl Default for PoolState {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl PoolState {
    /// Create an empty pool
    pub fn new(config: PoolConfig) -> Self {
        Self {
            reserve_a: 0,
            reserve_b: 0,
            total_shares: 0,
            config,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reserve_a == 0 || self.reserve_b == 0
    }

    pub fn reserves(&self) -> (u128, u128) {
        (self.reserve_a, self.reserve_b)
    }

    /// `(reserve_in, reserve_out)` for a swap direction
    pub fn reserves_for(&self, direction: Direction) -> (u128, u128) {
        match direction {
            Direction::AtoB => (self.reserve_a, self.reserve_b),
            Direction::BtoA => (self.reserve_b, self.reserve_a),
        }
    }

    /// Constant product of the current reserves
    pub fn invariant(&self) -> U256 {
        PricingEngine::invariant(self.reserve_a, self.reserve_b)
    }

    /// Check the empty-or-fully-seeded invariant and the share bookkeeping
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        if (self.reserve_a == 0) != (self.reserve_b == 0) {
            return Err(AmmError::InvalidState {
                reason: format!(
                    "one-sided reserves: a={} b={}",
                    self.reserve_a, self.reserve_b
                ),
            });
        }
        if (self.reserve_a == 0) != (self.total_shares == 0) {
            return Err(AmmError::InvalidState {
                reason: format!(
                    "share supply {} inconsistent with reserves a={} b={}",
                    self.total_shares, self.reserve_a, self.reserve_b
                ),
            });
        }
        Ok(())
    }

    /// Output for `amount_in` against the current reserves, no side effects
    pub fn quote(&self, direction: Direction, amount_in: u128) -> Result<u128> {
        let (reserve_in, reserve_out) = self.reserves_for(direction);
        PricingEngine::get_amount_out(amount_in, reserve_in, reserve_out, self.config.fee_bps)
    }

    /// Input required to receive `amount_out`, no side effects
    pub fn quote_input(&self, direction: Direction, amount_out: u128) -> Result<u128> {
        let (reserve_in, reserve_out) = self.reserves_for(direction);
        PricingEngine::get_amount_in(amount_out, reserve_in, reserve_out, self.config.fee_bps)
    }

    /// Execute a swap against the pool
    pub fn swap(
        &mut self,
        direction: Direction,
        amount_in: u128,
        min_amount_out: Option<u128>,
    ) -> Result<SwapOutcome> {
        if amount_in == 0 {
            return Err(AmmError::InvalidAmount { field: "amount_in" });
        }
        if self.is_empty() {
            return Err(AmmError::EmptyPool);
        }

        let (reserve_in, reserve_out) = self.reserves_for(direction);
        let amount_out = self.quote(direction, amount_in)?;
        if amount_out == 0 {
            return Err(AmmError::OutputTooSmall {
                direction,
                amount_in,
            });
        }
        if let Some(min_amount_out) = min_amount_out {
            if amount_out < min_amount_out {
                return Err(AmmError::SlippageExceeded {
                    amount_out,
                    min_amount_out,
                });
            }
        }

        let new_reserve_in = reserve_in
            .checked_add(amount_in)
            .ok_or(AmmError::Overflow { operation: "swap" })?;
        // amount_out < reserve_out by construction of the pricing formula
        let new_reserve_out = reserve_out - amount_out;

        match direction {
            Direction::AtoB => {
                self.reserve_a = new_reserve_in;
                self.reserve_b = new_reserve_out;
            }
            Direction::BtoA => {
                self.reserve_b = new_reserve_in;
                self.reserve_a = new_reserve_out;
            }
        }

        Ok(SwapOutcome {
            direction,
            amount_in,
            amount_out,
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
        })
    }

    /// Deposit both tokens into the pool
    ///
    /// The first deposit sets the price. Later deposits must sit within
    /// `ratio_tolerance_bps` of the pool ratio and are clamped to it exactly;
    /// whatever is not taken is reported as a refund.
    pub fn add_liquidity(&mut self, amount_a: u128, amount_b: u128) -> Result<LiquidityOutcome> {
        if amount_a == 0 {
            return Err(AmmError::InvalidAmount { field: "amount_a" });
        }
        if amount_b == 0 {
            return Err(AmmError::InvalidAmount { field: "amount_b" });
        }

        if self.is_empty() {
            let shares = PricingEngine::initial_shares(amount_a, amount_b)?;
            self.reserve_a = amount_a;
            self.reserve_b = amount_b;
            self.total_shares = shares;
            return Ok(LiquidityOutcome {
                effective_a: amount_a,
                effective_b: amount_b,
                refund_a: 0,
                refund_b: 0,
                shares_minted: shares,
                reserve_a: amount_a,
                reserve_b: amount_b,
            });
        }

        let expected_b = PricingEngine::mul_div(amount_a, self.reserve_b, self.reserve_a)?;
        if PricingEngine::exceeds_tolerance(amount_b, expected_b, self.config.ratio_tolerance_bps)
        {
            return Err(AmmError::RatioMismatch {
                amount_a,
                amount_b,
                expected_b,
                tolerance_bps: self.config.ratio_tolerance_bps,
            });
        }

        let (effective_a, effective_b) = if amount_b >= expected_b {
            (amount_a, expected_b)
        } else {
            let expected_a = PricingEngine::mul_div(amount_b, self.reserve_a, self.reserve_b)?;
            (expected_a, amount_b)
        };
        if effective_a == 0 || effective_b == 0 {
            return Err(AmmError::DepositTooSmall { amount_a, amount_b });
        }

        let shares = PricingEngine::proportional_shares(
            effective_a,
            effective_b,
            self.reserve_a,
            self.reserve_b,
            self.total_shares,
        )?;
        if shares == 0 {
            return Err(AmmError::DepositTooSmall { amount_a, amount_b });
        }

        let overflow = AmmError::Overflow {
            operation: "add_liquidity",
        };
        let reserve_a = self
            .reserve_a
            .checked_add(effective_a)
            .ok_or_else(|| overflow.clone())?;
        let reserve_b = self
            .reserve_b
            .checked_add(effective_b)
            .ok_or_else(|| overflow.clone())?;
        let total_shares = self.total_shares.checked_add(shares).ok_or(overflow)?;

        self.reserve_a = reserve_a;
        self.reserve_b = reserve_b;
        self.total_shares = total_shares;

        Ok(LiquidityOutcome {
            effective_a,
            effective_b,
            refund_a: amount_a - effective_a,
            refund_b: amount_b - effective_b,
            shares_minted: shares,
            reserve_a,
            reserve_b,
        })
    }

    /// Withdraw liquidity by burning shares
    ///
    /// Share redemption is not offered by this pool; the call always fails
    /// and never touches the reserves.
    pub fn remove_liquidity(&mut self, _shares: u128) -> Result<(u128, u128)> {
        Err(AmmError::NotSupported {
            operation: "remove_liquidity",
        })
    }

    /// Apply one operation: `(Pool, Operation) -> (Pool, Result)`
    pub fn apply(&mut self, operation: PoolOperation) -> Result<OperationOutcome> {
        match operation {
            PoolOperation::Swap {
                direction,
                amount_in,
                min_amount_out,
            } => self
                .swap(direction, amount_in, min_amount_out)
                .map(OperationOutcome::Swap),
            PoolOperation::AddLiquidity { amount_a, amount_b } => self
                .add_liquidity(amount_a, amount_b)
                .map(OperationOutcome::AddLiquidity),
            PoolOperation::RemoveLiquidity { shares } => {
                self.remove_liquidity(shares)
                    .map(|(amount_a, amount_b)| OperationOutcome::RemoveLiquidity {
                        amount_a,
                        amount_b,
                    })
            }
        }
    }
}

impl Stateful for PoolState {
    type Event = PoolOperation;
    type Outcome = OperationOutcome;
    type Error = AmmError;

    fn apply_event(&mut self, event: Self::Event) -> Result<Self::Outcome> {
        self.apply(event)
    }

    fn snapshot(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| AmmError::Snapshot {
            reason: e.to_string(),
        })
    }

    fn restore(&mut self, snapshot: &[u8]) -> Result<()> {
        let restored: PoolState =
            bincode::deserialize(snapshot).map_err(|e| AmmError::Snapshot {
                reason: e.to_string(),
            })?;
        restored.validate()?;
        *self = restored;
        Ok(())
    }
}

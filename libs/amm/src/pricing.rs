//! Constant product (x*y=k) pricing with exact integer arithmetic
//!
//! All amounts are `u128` base units. Products that can exceed 128 bits are
//! widened to `U256`, and every division floors so rounding always favours
//! the pool.

use crate::error::{AmmError, Result};
use ethers_core::types::U256;

/// Basis point denominator (10_000 bps = 100%)
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Default swap fee in basis points (30 = 0.3%)
pub const DEFAULT_FEE_BPS: u32 = 30;

/// Stateless constant product math
pub struct PricingEngine;

impl PricingEngine {
    /// Calculate exact output amount for a swap, fee taken on the input side
    ///
    /// # Arguments
    /// * `amount_in` - Input token amount (base units)
    /// * `reserve_in` - Input token reserve (base units)
    /// * `reserve_out` - Output token reserve (base units)
    /// * `fee_bps` - Fee in basis points (30 = 0.3%)
    ///
    /// # Returns
    /// `floor(amount_in_with_fee * reserve_out / (reserve_in * 10000 + amount_in_with_fee))`,
    /// always strictly below `reserve_out`.
    pub fn get_amount_out(
        amount_in: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee_bps: u32,
    ) -> Result<u128> {
        if amount_in == 0 {
            return Err(AmmError::InvalidAmount { field: "amount_in" });
        }
        if reserve_in == 0 || reserve_out == 0 {
            return Err(AmmError::EmptyPool);
        }
        let fee_multiplier = Self::fee_multiplier(fee_bps)?;

        let amount_in_with_fee = U256::from(amount_in) * U256::from(fee_multiplier);
        let numerator = amount_in_with_fee
            .checked_mul(U256::from(reserve_out))
            .ok_or(AmmError::Overflow {
                operation: "get_amount_out",
            })?;
        let denominator =
            U256::from(reserve_in) * U256::from(BPS_DENOMINATOR) + amount_in_with_fee;

        to_u128(numerator / denominator, "get_amount_out")
    }

    /// Calculate the minimum input that yields `amount_out` (reverse quote)
    ///
    /// Rounded up by one base unit so the returned input is always sufficient.
    pub fn get_amount_in(
        amount_out: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee_bps: u32,
    ) -> Result<u128> {
        if amount_out == 0 {
            return Err(AmmError::InvalidAmount { field: "amount_out" });
        }
        if reserve_in == 0 || reserve_out == 0 {
            return Err(AmmError::EmptyPool);
        }
        if amount_out >= reserve_out {
            return Err(AmmError::InsufficientLiquidity {
                requested: amount_out,
                available: reserve_out,
            });
        }
        let fee_multiplier = Self::fee_multiplier(fee_bps)?;

        let numerator = U256::from(reserve_in)
            .checked_mul(U256::from(amount_out))
            .and_then(|v| v.checked_mul(U256::from(BPS_DENOMINATOR)))
            .ok_or(AmmError::Overflow {
                operation: "get_amount_in",
            })?;
        let denominator = U256::from(reserve_out - amount_out) * U256::from(fee_multiplier);

        to_u128(numerator / denominator + U256::one(), "get_amount_in")
    }

    /// `floor(a * b / denominator)` without intermediate overflow
    pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128> {
        if denominator == 0 {
            return Err(AmmError::EmptyPool);
        }
        to_u128(
            U256::from(a) * U256::from(b) / U256::from(denominator),
            "mul_div",
        )
    }

    /// Counterpart amount that keeps a deposit at the pool ratio
    ///
    /// `amount * reserve_to / reserve_from`, floored.
    pub fn proportional_amount(amount: u128, reserve_from: u128, reserve_to: u128) -> Result<u128> {
        if amount == 0 {
            return Err(AmmError::InvalidAmount { field: "amount" });
        }
        if reserve_from == 0 || reserve_to == 0 {
            return Err(AmmError::EmptyPool);
        }
        Self::mul_div(amount, reserve_to, reserve_from)
    }

    /// Whether `actual` deviates from `expected` by more than `tolerance_bps`
    ///
    /// Compared as `|actual - expected| * 10000 > expected * tolerance_bps`,
    /// so no precision is lost to an intermediate percentage.
    pub fn exceeds_tolerance(actual: u128, expected: u128, tolerance_bps: u32) -> bool {
        let diff = actual.abs_diff(expected);
        U256::from(diff) * U256::from(BPS_DENOMINATOR)
            > U256::from(expected) * U256::from(tolerance_bps)
    }

    /// Deviation of a deposit's B side from the pool ratio, in basis points
    pub fn ratio_deviation_bps(
        amount_a: u128,
        amount_b: u128,
        reserve_a: u128,
        reserve_b: u128,
    ) -> Result<u128> {
        let expected_b = Self::proportional_amount(amount_a, reserve_a, reserve_b)?;
        if expected_b == 0 {
            return Err(AmmError::DepositTooSmall { amount_a, amount_b });
        }
        let diff = amount_b.abs_diff(expected_b);
        Self::mul_div(diff, BPS_DENOMINATOR as u128, expected_b)
    }

    /// Minimum acceptable output for a quote under a slippage tolerance
    pub fn min_amount_out(quoted: u128, slippage_bps: u32) -> Result<u128> {
        if slippage_bps > BPS_DENOMINATOR {
            return Err(AmmError::InvalidSlippage { slippage_bps });
        }
        Self::mul_div(
            quoted,
            (BPS_DENOMINATOR - slippage_bps) as u128,
            BPS_DENOMINATOR as u128,
        )
    }

    /// Shortfall of `amount_out` against the mid-price output, in basis points
    pub fn price_impact_bps(
        amount_in: u128,
        amount_out: u128,
        reserve_in: u128,
        reserve_out: u128,
    ) -> Result<u32> {
        if reserve_in == 0 || reserve_out == 0 {
            return Err(AmmError::EmptyPool);
        }
        let ideal_out = Self::mul_div(amount_in, reserve_out, reserve_in)?;
        if ideal_out == 0 || amount_out >= ideal_out {
            return Ok(0);
        }
        let impact = Self::mul_div(ideal_out - amount_out, BPS_DENOMINATOR as u128, ideal_out)?;
        Ok(impact as u32)
    }

    /// Shares for the first deposit: geometric mean of both amounts
    pub fn initial_shares(amount_a: u128, amount_b: u128) -> Result<u128> {
        to_u128(
            (U256::from(amount_a) * U256::from(amount_b)).integer_sqrt(),
            "initial_shares",
        )
    }

    /// Shares for a later deposit: the smaller of both proportional claims
    pub fn proportional_shares(
        amount_a: u128,
        amount_b: u128,
        reserve_a: u128,
        reserve_b: u128,
        total_shares: u128,
    ) -> Result<u128> {
        let from_a = Self::mul_div(amount_a, total_shares, reserve_a)?;
        let from_b = Self::mul_div(amount_b, total_shares, reserve_b)?;
        Ok(from_a.min(from_b))
    }

    /// Constant product `reserve_a * reserve_b`
    pub fn invariant(reserve_a: u128, reserve_b: u128) -> U256 {
        U256::from(reserve_a) * U256::from(reserve_b)
    }

    fn fee_multiplier(fee_bps: u32) -> Result<u32> {
        if fee_bps >= BPS_DENOMINATOR {
            return Err(AmmError::InvalidFee { fee_bps });
        }
        Ok(BPS_DENOMINATOR - fee_bps)
    }
}

fn to_u128(value: U256, operation: &'static str) -> Result<u128> {
    if value.bits() > 128 {
        return Err(AmmError::Overflow { operation });
    }
    Ok(value.low_u128())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_swap_output() {
        // 10 in against 1000:1000 at 0.3% -> 9.87, floored to 9
        let out = PricingEngine::get_amount_out(10, 1000, 1000, 30).unwrap();
        assert_eq!(out, 9);
    }

    #[test]
    fn test_matches_997_over_1000_form() {
        let cases = [
            (10u128, 1_000u128, 1_000u128),
            (123_456, 9_999_999, 77_777),
            (10u128.pow(19), 5 * 10u128.pow(20), 5 * 10u128.pow(20)),
        ];
        for (amount_in, reserve_in, reserve_out) in cases {
            let with_fee = U256::from(amount_in) * U256::from(997u32);
            let expected = with_fee * U256::from(reserve_out)
                / (U256::from(reserve_in) * U256::from(1000u32) + with_fee);
            let out =
                PricingEngine::get_amount_out(amount_in, reserve_in, reserve_out, 30).unwrap();
            assert_eq!(out, expected.low_u128());
        }
    }

    #[test]
    fn test_eighteen_decimal_swap() {
        let one = 10u128.pow(18);
        let out = PricingEngine::get_amount_out(10 * one, 500 * one, 500 * one, 30).unwrap();
        // ~9.7751 tokens
        assert!(out > 9_775 * one / 1000 && out < 9_776 * one / 1000);
    }

    #[test]
    fn test_empty_reserves_rejected() {
        assert_eq!(
            PricingEngine::get_amount_out(10, 0, 1000, 30),
            Err(AmmError::EmptyPool)
        );
        assert_eq!(
            PricingEngine::get_amount_out(10, 1000, 0, 30),
            Err(AmmError::EmptyPool)
        );
    }

    #[test]
    fn test_zero_input_rejected() {
        assert_eq!(
            PricingEngine::get_amount_out(0, 1000, 1000, 30),
            Err(AmmError::InvalidAmount { field: "amount_in" })
        );
    }

    #[test]
    fn test_invalid_fee_rejected() {
        assert_eq!(
            PricingEngine::get_amount_out(10, 1000, 1000, 10_000),
            Err(AmmError::InvalidFee { fee_bps: 10_000 })
        );
    }

    #[test]
    fn test_huge_amounts_report_overflow() {
        let result = PricingEngine::get_amount_out(u128::MAX, u128::MAX, u128::MAX, 30);
        assert_eq!(
            result,
            Err(AmmError::Overflow {
                operation: "get_amount_out"
            })
        );
    }

    #[test]
    fn test_amount_in_covers_requested_output() {
        let amount_in = PricingEngine::get_amount_in(100, 10_000, 20_000, 30).unwrap();
        let out = PricingEngine::get_amount_out(amount_in, 10_000, 20_000, 30).unwrap();
        assert!(out >= 100);
        let short = PricingEngine::get_amount_out(amount_in - 1, 10_000, 20_000, 30).unwrap();
        assert!(short <= 100);
    }

    #[test]
    fn test_amount_in_rejects_draining_request() {
        assert_eq!(
            PricingEngine::get_amount_in(1000, 1000, 1000, 30),
            Err(AmmError::InsufficientLiquidity {
                requested: 1000,
                available: 1000
            })
        );
    }

    #[test]
    fn test_tolerance_boundary() {
        // exactly 1% off is allowed, anything past it is not
        assert!(!PricingEngine::exceeds_tolerance(99, 100, 100));
        assert!(!PricingEngine::exceeds_tolerance(101, 100, 100));
        assert!(PricingEngine::exceeds_tolerance(97, 100, 100));
        assert!(PricingEngine::exceeds_tolerance(1, 0, 100));
        assert!(!PricingEngine::exceeds_tolerance(0, 0, 100));
    }

    #[test]
    fn test_ratio_deviation() {
        assert_eq!(
            PricingEngine::ratio_deviation_bps(100, 97, 1000, 1000).unwrap(),
            300
        );
        assert_eq!(
            PricingEngine::ratio_deviation_bps(100, 200, 1000, 2000).unwrap(),
            0
        );
    }

    #[test]
    fn test_min_amount_out() {
        assert_eq!(PricingEngine::min_amount_out(10_000, 50).unwrap(), 9_950);
        assert_eq!(PricingEngine::min_amount_out(9, 50).unwrap(), 8);
        assert_eq!(PricingEngine::min_amount_out(9, 0).unwrap(), 9);
        assert_eq!(
            PricingEngine::min_amount_out(9, 10_001),
            Err(AmmError::InvalidSlippage {
                slippage_bps: 10_001
            })
        );
    }

    #[test]
    fn test_price_impact() {
        let out = PricingEngine::get_amount_out(100, 1000, 2000, 30).unwrap();
        let impact = PricingEngine::price_impact_bps(100, out, 1000, 2000).unwrap();
        // 10% of the reserve moves the price by roughly 9.3%
        assert!(impact > 900 && impact < 1000);
    }

    #[test]
    fn test_share_math() {
        assert_eq!(PricingEngine::initial_shares(500, 500).unwrap(), 500);
        assert_eq!(PricingEngine::initial_shares(100, 400).unwrap(), 200);
        assert_eq!(
            PricingEngine::proportional_shares(100, 90, 1000, 1000, 1000).unwrap(),
            90
        );
    }
}

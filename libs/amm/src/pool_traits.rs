//! Pool trait definitions for a unified quoting interface

use crate::engine::AmmEngine;
use crate::error::Result;
use crate::pool_state::{Direction, PoolState};
use crate::pricing::PricingEngine;
use crate::units;
use rust_decimal::Decimal;

/// Read-only pricing view shared by a bare pool state and the engine
pub trait AmmPool {
    /// Calculate output amount for given input
    fn get_amount_out(&self, direction: Direction, amount_in: u128) -> Result<u128>;

    /// Calculate required input for desired output
    fn get_amount_in(&self, direction: Direction, amount_out: u128) -> Result<u128>;

    /// Get current reserves `(reserve_a, reserve_b)`
    fn get_liquidity(&self) -> (u128, u128);

    /// Get fee tier
    fn get_fee_bps(&self) -> u32;

    /// Quote plus the minimum output a caller should accept under `slippage_bps`
    fn quote_with_slippage(
        &self,
        direction: Direction,
        amount_in: u128,
        slippage_bps: u32,
    ) -> Result<(u128, u128)> {
        let quoted = self.get_amount_out(direction, amount_in)?;
        let min_out = PricingEngine::min_amount_out(quoted, slippage_bps)?;
        Ok((quoted, min_out))
    }

    /// Counterpart deposit that matches the pool ratio
    ///
    /// With `Direction::AtoB`, `amount` is an A amount and the result is B.
    fn proportional_deposit(&self, direction: Direction, amount: u128) -> Result<u128> {
        let (reserve_a, reserve_b) = self.get_liquidity();
        match direction {
            Direction::AtoB => PricingEngine::proportional_amount(amount, reserve_a, reserve_b),
            Direction::BtoA => PricingEngine::proportional_amount(amount, reserve_b, reserve_a),
        }
    }

    /// Exchange rate: units of output token per unit of input token
    fn spot_price(&self, direction: Direction) -> Result<Decimal> {
        let (reserve_a, reserve_b) = self.get_liquidity();
        match direction {
            Direction::AtoB => units::spot_price(reserve_a, reserve_b),
            Direction::BtoA => units::spot_price(reserve_b, reserve_a),
        }
    }

    /// Price impact in basis points of trading `amount_in`
    fn price_impact_bps(&self, direction: Direction, amount_in: u128) -> Result<u32> {
        let amount_out = self.get_amount_out(direction, amount_in)?;
        let (reserve_a, reserve_b) = self.get_liquidity();
        let (reserve_in, reserve_out) = match direction {
            Direction::AtoB => (reserve_a, reserve_b),
            Direction::BtoA => (reserve_b, reserve_a),
        };
        PricingEngine::price_impact_bps(amount_in, amount_out, reserve_in, reserve_out)
    }
}

impl AmmPool for PoolState {
    fn get_amount_out(&self, direction: Direction, amount_in: u128) -> Result<u128> {
        self.quote(direction, amount_in)
    }

    fn get_amount_in(&self, direction: Direction, amount_out: u128) -> Result<u128> {
        self.quote_input(direction, amount_out)
    }

    fn get_liquidity(&self) -> (u128, u128) {
        self.reserves()
    }

    fn get_fee_bps(&self) -> u32 {
        self.config.fee_bps
    }
}

// Default methods on the engine would read the reserves more than once; a
// single snapshot keeps every derived figure consistent.
impl AmmPool for AmmEngine {
    fn get_amount_out(&self, direction: Direction, amount_in: u128) -> Result<u128> {
        self.quote(direction, amount_in)
    }

    fn get_amount_in(&self, direction: Direction, amount_out: u128) -> Result<u128> {
        self.quote_input(direction, amount_out)
    }

    fn get_liquidity(&self) -> (u128, u128) {
        self.reserves()
    }

    fn get_fee_bps(&self) -> u32 {
        self.config().fee_bps
    }

    fn price_impact_bps(&self, direction: Direction, amount_in: u128) -> Result<u32> {
        self.pool().price_impact_bps(direction, amount_in)
    }

    fn quote_with_slippage(
        &self,
        direction: Direction,
        amount_in: u128,
        slippage_bps: u32,
    ) -> Result<(u128, u128)> {
        self.pool().quote_with_slippage(direction, amount_in, slippage_bps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AmmError;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_with_slippage() {
        let engine = AmmEngine::default();
        engine.add_liquidity(1_000_000, 1_000_000).unwrap();
        let (quoted, min_out) = engine
            .quote_with_slippage(Direction::AtoB, 10_000, 50)
            .unwrap();
        assert_eq!(quoted, 9_871);
        assert_eq!(min_out, 9_821);
    }

    #[test]
    fn test_proportional_deposit_both_ways() {
        let mut pool = PoolState::default();
        pool.add_liquidity(1_000, 4_000).unwrap();
        assert_eq!(pool.proportional_deposit(Direction::AtoB, 10).unwrap(), 40);
        assert_eq!(pool.proportional_deposit(Direction::BtoA, 40).unwrap(), 10);
    }

    #[test]
    fn test_spot_price_and_impact() {
        let mut pool = PoolState::default();
        pool.add_liquidity(1_000, 2_000).unwrap();
        assert_eq!(pool.spot_price(Direction::AtoB), Ok(dec!(2)));
        assert_eq!(pool.spot_price(Direction::BtoA), Ok(dec!(0.5)));
        assert_eq!(pool.price_impact_bps(Direction::AtoB, 100).unwrap(), 950);
        assert_eq!(
            PoolState::default().spot_price(Direction::AtoB),
            Err(AmmError::EmptyPool)
        );
    }

    #[test]
    fn test_spot_price_on_pool_beyond_decimal_range() {
        let mut pool = PoolState::default();
        let reserve = 10u128.pow(29);
        pool.add_liquidity(reserve, reserve).unwrap();
        assert_eq!(pool.spot_price(Direction::AtoB), Ok(dec!(1)));
        assert_eq!(pool.spot_price(Direction::BtoA), Ok(dec!(1)));
    }
}

//! Base-unit conversion and display figures
//!
//! Exact decimal equivalents of the figures a client shows next to the pool:
//! human-readable amounts, exchange rate and reserve composition. Nothing in
//! here feeds back into pricing.

use crate::error::{AmmError, Result};
use crate::pricing::{PricingEngine, BPS_DENOMINATOR};
use ethers_core::types::U256;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;

/// Largest scale `Decimal` can carry
pub const MAX_DECIMALS: u32 = 28;

const DECIMAL_MANTISSA_BITS: usize = 96;

/// Convert base units to a human amount (`formatUnits`)
///
/// Exact for every `u128`; trailing fractional zeros are dropped.
pub fn format_units(amount: u128, decimals: u32) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }
    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// Convert a human amount to base units (`parseUnits`)
///
/// Rejects negative values and more fractional digits than `decimals`.
pub fn parse_units(input: &str, decimals: u32) -> Result<u128> {
    let value = Decimal::from_str(input.trim()).map_err(|_| AmmError::InvalidUnits {
        input: input.to_string(),
        reason: "not a decimal number",
    })?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmmError::InvalidUnits {
            input: input.to_string(),
            reason: "amount is negative",
        });
    }
    let value = value.normalize();
    if value.scale() > decimals {
        return Err(AmmError::InvalidUnits {
            input: input.to_string(),
            reason: "too many fractional digits",
        });
    }
    let overflow = AmmError::Overflow {
        operation: "parse_units",
    };
    let mantissa = u128::try_from(value.mantissa()).map_err(|_| overflow.clone())?;
    10u128
        .checked_pow(decimals - value.scale())
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or(overflow)
}

/// Exchange rate `reserve_out / reserve_in`
///
/// Divided in 256 bits at the largest scale whose quotient fits a `Decimal`
/// mantissa, truncating toward zero. Fails with `EmptyPool` on an empty pool
/// and `Overflow` when the rate itself exceeds `Decimal::MAX`.
pub fn spot_price(reserve_in: u128, reserve_out: u128) -> Result<Decimal> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(AmmError::EmptyPool);
    }
    let numerator = U256::from(reserve_out);
    let denominator = U256::from(reserve_in);
    for scale in (0..=MAX_DECIMALS).rev() {
        let quotient = numerator * U256::exp10(scale as usize) / denominator;
        if quotient.bits() > DECIMAL_MANTISSA_BITS {
            continue;
        }
        if let Ok(price) = Decimal::try_from_i128_with_scale(quotient.low_u128() as i128, scale) {
            return Ok(price.normalize());
        }
    }
    Err(AmmError::Overflow {
        operation: "spot_price",
    })
}

/// Share of each reserve in the pool, in percent with two decimals
///
/// An empty pool reads as an even split.
pub fn composition(reserve_a: u128, reserve_b: u128) -> (Decimal, Decimal) {
    let total = match reserve_a.checked_add(reserve_b) {
        Some(0) => return (dec!(50), dec!(50)),
        Some(total) => total,
        // halve both sides; the ratio is what matters
        None => return composition(reserve_a / 2, reserve_b / 2),
    };
    let a_bps = PricingEngine::mul_div(reserve_a, BPS_DENOMINATOR as u128, total).unwrap_or(0);
    let a_percent = Decimal::new(a_bps as i64, 2);
    (a_percent, dec!(100) - a_percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("10", 18).unwrap(), 10 * 10u128.pow(18));
        assert_eq!(parse_units("0.5", 18).unwrap(), 5 * 10u128.pow(17));
        assert_eq!(parse_units("1.250", 2).unwrap(), 125);
        assert_eq!(parse_units(" 42 ", 0).unwrap(), 42);
    }

    #[test]
    fn test_parse_units_rejects_bad_input() {
        assert!(matches!(
            parse_units("-1", 18),
            Err(AmmError::InvalidUnits { reason: "amount is negative", .. })
        ));
        assert!(matches!(
            parse_units("1.001", 2),
            Err(AmmError::InvalidUnits { reason: "too many fractional digits", .. })
        ));
        assert!(matches!(
            parse_units("ten", 18),
            Err(AmmError::InvalidUnits { .. })
        ));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(10 * 10u128.pow(18), 18), "10");
        assert_eq!(format_units(9_775_082_000_000_000_000, 18), "9.775082");
        assert_eq!(format_units(5, 18), "0.000000000000000005");
        assert_eq!(format_units(0, 18), "0");
        assert_eq!(format_units(1250, 0), "1250");
    }

    #[test]
    fn test_format_units_beyond_decimal_range() {
        assert_eq!(format_units(10u128.pow(29), 18), "100000000000");
        assert_eq!(format_units(u128::MAX, 0), u128::MAX.to_string());
        assert_eq!(
            format_units(u128::MAX, 18),
            "340282366920938463463.374607431768211455"
        );
    }

    #[test]
    fn test_spot_price() {
        assert_eq!(spot_price(1000, 2000), Ok(dec!(2)));
        assert_eq!(spot_price(2000, 1000), Ok(dec!(0.5)));
        assert_eq!(spot_price(3, 1), Ok(dec!(0.3333333333333333333333333333)));
        assert_eq!(spot_price(0, 1000), Err(AmmError::EmptyPool));
    }

    #[test]
    fn test_spot_price_on_large_reserves() {
        let reserve = 10u128.pow(29);
        assert_eq!(spot_price(reserve, reserve), Ok(dec!(1)));
        assert_eq!(spot_price(reserve, 2 * reserve), Ok(dec!(2)));
        let quarter = u128::MAX / 4;
        assert_eq!(spot_price(quarter * 4, quarter), Ok(dec!(0.25)));
        assert_eq!(
            spot_price(1, u128::MAX),
            Err(AmmError::Overflow {
                operation: "spot_price"
            })
        );
    }

    #[test]
    fn test_composition() {
        assert_eq!(composition(0, 0), (dec!(50), dec!(50)));
        assert_eq!(composition(1000, 3000), (dec!(25), dec!(75)));
        let (a, b) = composition(1, 2);
        assert_eq!(a, dec!(33.33));
        assert_eq!(b, dec!(66.67));
    }
}

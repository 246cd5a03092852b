//! Simulation session
//!
//! Hosts one [`AmmEngine`] for the duration of a CLI invocation, converting
//! human amounts to base units on the way in and rendering outcomes with
//! token symbols on the way out. Amounts in reports are exact decimal
//! strings, so every reserve the engine accepts can be shown.

use crate::state_store::StoredPool;
use anyhow::{Context, Result};
use duoswap_amm::units::{composition, format_units, parse_units};
use duoswap_amm::{
    AmmEngine, AmmPool, Decimal, Direction, JournalEntry, PoolConfig, PoolState, PricingEngine,
    ReplaySummary,
};
use duoswap_config::AmmConfig;
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// How the minimum acceptable output of a swap is chosen
#[derive(Debug, Clone, PartialEq)]
pub enum SlippageGuard {
    /// No floor
    None,
    /// Explicit floor as a human amount
    MinOut(String),
    /// Quote first and derive the floor from a tolerance
    Tolerance(u32),
}

#[derive(Debug, Clone, Serialize)]
pub struct QuoteReport {
    pub direction: Direction,
    pub amount_in: String,
    pub amount_out: String,
    pub min_amount_out: String,
    pub slippage_bps: u32,
    pub price_impact_bps: u32,
    pub symbol_in: String,
    pub symbol_out: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwapReport {
    pub direction: Direction,
    pub amount_in: String,
    pub amount_out: String,
    pub min_amount_out: Option<String>,
    pub reserve_a: String,
    pub reserve_b: String,
    pub symbol_in: String,
    pub symbol_out: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiquidityReport {
    pub effective_a: String,
    pub effective_b: String,
    pub refund_a: String,
    pub refund_b: String,
    /// Off-ratio part of the request; `None` for the first deposit
    pub ratio_deviation_bps: Option<u128>,
    pub shares_minted: String,
    pub reserve_a: String,
    pub reserve_b: String,
    pub symbol_a: String,
    pub symbol_b: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub empty: bool,
    pub reserve_a: String,
    pub reserve_b: String,
    pub total_shares: String,
    /// `None` when the pool is empty or the rate exceeds `Decimal`
    pub rate_a_to_b: Option<Decimal>,
    pub rate_b_to_a: Option<Decimal>,
    pub percent_a: Decimal,
    pub percent_b: Decimal,
    pub fee_bps: u32,
    pub ratio_tolerance_bps: u32,
    pub last_sequence: u64,
    pub symbol_a: String,
    pub symbol_b: String,
}

pub struct Simulator {
    engine: AmmEngine,
    config: AmmConfig,
}

impl Simulator {
    /// Host a stored pool, or a fresh one priced per `config`
    pub fn new(config: AmmConfig, stored: Option<StoredPool>) -> Result<Self> {
        let stored = match stored {
            Some(stored) => {
                if stored.pool.config.fee_bps != config.pool.fee_bps {
                    warn!(
                        stored = stored.pool.config.fee_bps,
                        configured = config.pool.fee_bps,
                        "Stored pool keeps its own fee; configured fee ignored"
                    );
                }
                stored
            }
            None => StoredPool {
                last_sequence: 0,
                pool: Self::empty_pool(&config),
            },
        };
        let engine = AmmEngine::resume(stored.pool, stored.last_sequence)
            .context("Refusing to host invalid pool")?;
        Ok(Self { engine, config })
    }

    /// Empty pool with the configured pricing parameters
    pub fn empty_pool(config: &AmmConfig) -> PoolState {
        PoolState::new(PoolConfig {
            fee_bps: config.pool.fee_bps,
            ratio_tolerance_bps: config.pool.ratio_tolerance_bps,
        })
    }

    pub fn pool(&self) -> PoolState {
        self.engine.pool()
    }

    /// Current pool and journal position, ready to persist
    pub fn stored(&self) -> StoredPool {
        let (pool, last_sequence) = self.engine.journal_position();
        StoredPool {
            last_sequence,
            pool,
        }
    }

    pub fn quote(&self, direction: Direction, amount: &str) -> Result<QuoteReport> {
        let amount_in = self.parse(amount)?;
        let slippage_bps = self.config.pool.default_slippage_bps;
        let (amount_out, min_amount_out) = self
            .engine
            .quote_with_slippage(direction, amount_in, slippage_bps)
            .context("Quote failed")?;
        let price_impact_bps = self.engine.price_impact_bps(direction, amount_in)?;
        let (symbol_in, symbol_out) = self.symbols(direction);

        Ok(QuoteReport {
            direction,
            amount_in: self.format(amount_in),
            amount_out: self.format(amount_out),
            min_amount_out: self.format(min_amount_out),
            slippage_bps,
            price_impact_bps,
            symbol_in,
            symbol_out,
        })
    }

    pub fn swap(
        &self,
        direction: Direction,
        amount: &str,
        guard: SlippageGuard,
    ) -> Result<SwapReport> {
        let amount_in = self.parse(amount)?;
        let min_amount_out = match guard {
            SlippageGuard::None => None,
            SlippageGuard::MinOut(min_out) => Some(self.parse(&min_out)?),
            SlippageGuard::Tolerance(slippage_bps) => {
                let (_, min_out) = self
                    .engine
                    .quote_with_slippage(direction, amount_in, slippage_bps)
                    .context("Quote failed")?;
                Some(min_out)
            }
        };
        let (symbol_in, symbol_out) = self.symbols(direction);

        let outcome = self
            .engine
            .swap(direction, amount_in, min_amount_out)
            .context("Swap failed")?;

        Ok(SwapReport {
            direction,
            amount_in: self.format(outcome.amount_in),
            amount_out: self.format(outcome.amount_out),
            min_amount_out: min_amount_out.map(|m| self.format(m)),
            reserve_a: self.format(outcome.reserve_a),
            reserve_b: self.format(outcome.reserve_b),
            symbol_in,
            symbol_out,
        })
    }

    pub fn add_liquidity(&self, amount_a: &str, amount_b: &str) -> Result<LiquidityReport> {
        let amount_a = self.parse(amount_a)?;
        let amount_b = self.parse(amount_b)?;
        let (reserve_a, reserve_b) = self.engine.reserves();
        let ratio_deviation_bps =
            PricingEngine::ratio_deviation_bps(amount_a, amount_b, reserve_a, reserve_b).ok();

        let outcome = self
            .engine
            .add_liquidity(amount_a, amount_b)
            .context("Add liquidity failed")?;

        Ok(LiquidityReport {
            effective_a: self.format(outcome.effective_a),
            effective_b: self.format(outcome.effective_b),
            refund_a: self.format(outcome.refund_a),
            refund_b: self.format(outcome.refund_b),
            ratio_deviation_bps,
            shares_minted: self.format(outcome.shares_minted),
            reserve_a: self.format(outcome.reserve_a),
            reserve_b: self.format(outcome.reserve_b),
            symbol_a: self.config.tokens.symbol_a.clone(),
            symbol_b: self.config.tokens.symbol_b.clone(),
        })
    }

    pub fn remove_liquidity(&self, shares: &str) -> Result<(String, String)> {
        let shares = self.parse(shares)?;
        let (amount_a, amount_b) = self
            .engine
            .remove_liquidity(shares)
            .context("Remove liquidity failed")?;
        Ok((self.format(amount_a), self.format(amount_b)))
    }

    /// Apply recorded operations (base units) after the stored position
    pub fn replay(&self, entries: Vec<JournalEntry>) -> Result<ReplaySummary> {
        self.engine.replay(entries).context("Journal replay failed")
    }

    pub fn status(&self) -> StatusReport {
        let (pool, last_sequence) = self.engine.journal_position();
        let (percent_a, percent_b) = composition(pool.reserve_a, pool.reserve_b);

        StatusReport {
            empty: pool.is_empty(),
            reserve_a: self.format(pool.reserve_a),
            reserve_b: self.format(pool.reserve_b),
            total_shares: self.format(pool.total_shares),
            rate_a_to_b: pool.spot_price(Direction::AtoB).ok(),
            rate_b_to_a: pool.spot_price(Direction::BtoA).ok(),
            percent_a,
            percent_b,
            fee_bps: pool.config.fee_bps,
            ratio_tolerance_bps: pool.config.ratio_tolerance_bps,
            last_sequence,
            symbol_a: self.config.tokens.symbol_a.clone(),
            symbol_b: self.config.tokens.symbol_b.clone(),
        }
    }

    fn parse(&self, amount: &str) -> Result<u128> {
        parse_units(amount, self.config.tokens.decimals)
            .with_context(|| format!("Invalid amount '{}'", amount))
    }

    fn format(&self, amount: u128) -> String {
        format_units(amount, self.config.tokens.decimals)
    }

    fn symbols(&self, direction: Direction) -> (String, String) {
        let a = self.config.tokens.symbol_a.clone();
        let b = self.config.tokens.symbol_b.clone();
        match direction {
            Direction::AtoB => (a, b),
            Direction::BtoA => (b, a),
        }
    }
}

fn is_zero_amount(amount: &str) -> bool {
    amount == "0"
}

fn rate_text(rate: Option<Decimal>) -> String {
    match rate {
        Some(rate) => rate.round_dp(6).normalize().to_string(),
        None => "out of range".to_string(),
    }
}

impl fmt::Display for QuoteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} -> {} {}",
            self.amount_in, self.symbol_in, self.amount_out, self.symbol_out
        )?;
        writeln!(
            f,
            "Minimum received ({} bps slippage): {} {}",
            self.slippage_bps, self.min_amount_out, self.symbol_out
        )?;
        write!(f, "Price impact: {} bps", self.price_impact_bps)
    }
}

impl fmt::Display for SwapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Swapped {} {} for {} {}",
            self.amount_in, self.symbol_in, self.amount_out, self.symbol_out
        )?;
        if let Some(min) = &self.min_amount_out {
            writeln!(f, "Minimum accepted: {} {}", min, self.symbol_out)?;
        }
        write!(f, "Reserves: {} / {}", self.reserve_a, self.reserve_b)
    }
}

impl fmt::Display for LiquidityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Deposited {} {} + {} {}",
            self.effective_a, self.symbol_a, self.effective_b, self.symbol_b
        )?;
        if !is_zero_amount(&self.refund_a) || !is_zero_amount(&self.refund_b) {
            writeln!(
                f,
                "Refunded {} {} + {} {}",
                self.refund_a, self.symbol_a, self.refund_b, self.symbol_b
            )?;
        }
        if let Some(deviation) = self.ratio_deviation_bps.filter(|d| *d > 0) {
            writeln!(f, "Off pool ratio by {} bps", deviation)?;
        }
        writeln!(f, "Shares minted: {}", self.shares_minted)?;
        write!(
            f,
            "Reserves: {} {} / {} {}",
            self.reserve_a, self.symbol_a, self.reserve_b, self.symbol_b
        )
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Reserves: {} {} ({}%) / {} {} ({}%)",
            self.reserve_a,
            self.symbol_a,
            self.percent_a,
            self.reserve_b,
            self.symbol_b,
            self.percent_b
        )?;
        if self.empty {
            writeln!(f, "Rate: N/A (pool empty)")?;
        } else {
            writeln!(
                f,
                "Rate: 1 {} = {} {}, 1 {} = {} {}",
                self.symbol_a,
                rate_text(self.rate_a_to_b),
                self.symbol_b,
                self.symbol_b,
                rate_text(self.rate_b_to_a),
                self.symbol_a
            )?;
        }
        writeln!(f, "Total shares: {}", self.total_shares)?;
        writeln!(f, "Operations journaled: {}", self.last_sequence)?;
        write!(
            f,
            "Fee: {} bps, deposit tolerance: {} bps",
            self.fee_bps, self.ratio_tolerance_bps
        )
    }
}

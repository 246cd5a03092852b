//! # DuoSwap Configuration
//!
//! Constants and layered configuration for processes hosting the AMM core.
//!
//! ## Features
//!
//! - **Pool Constants**: fee, ratio tolerance and slippage defaults in basis points
//! - **Token Constants**: decimals and display symbols
//! - **Host Configuration**: TOML file, per-environment overlay, `DUOSWAP_*` overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use duoswap_config::{constants, load_config};
//!
//! let config = load_config(None, None)?;
//! assert!(config.pool.fee_bps < constants::BPS_DENOMINATOR);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod amm_config;
pub mod constants;

// Re-export commonly used types
pub use amm_config::{load_config, AmmConfig, GlobalConfig, PoolSettings, TokenSettings};

//! Pool constants and defaults
//!
//! Values shared by the engine host and its callers so that fee, tolerance
//! and precision defaults are defined in one place.

/// Basis point denominator (10_000 bps = 100%)
pub use duoswap_amm::BPS_DENOMINATOR;

/// Pricing defaults
pub mod pool {
    /// Swap fee (30 bps) and accepted deposit ratio deviation (100 bps)
    pub use duoswap_amm::{DEFAULT_FEE_BPS, DEFAULT_RATIO_TOLERANCE_BPS};

    /// Slippage applied when deriving a minimum output from a quote (0.5%)
    pub const DEFAULT_SLIPPAGE_BPS: u32 = 50;
}

/// Token defaults
pub mod tokens {
    /// ERC-20 style 18-decimal fixed point
    pub const DEFAULT_DECIMALS: u32 = 18;

    /// Largest decimals an input amount can carry
    pub use duoswap_amm::units::MAX_DECIMALS;

    pub const TOKEN_A_SYMBOL: &str = "TKA";
    pub const TOKEN_B_SYMBOL: &str = "TKB";
}

/// Simulator host defaults
pub mod simulator {
    /// Pool state file used when none is configured
    pub const DEFAULT_STATE_FILE: &str = "./data/pool_state.json";

    /// Prefix for environment overrides (`DUOSWAP_POOL__FEE_BPS=25`)
    pub const ENV_PREFIX: &str = "DUOSWAP";

    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

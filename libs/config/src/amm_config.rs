//! AMM Host Configuration
//!
//! Layered configuration for processes hosting the pool: built-in defaults,
//! an optional TOML file, an optional per-environment overlay and finally
//! `DUOSWAP_*` environment variables.

use crate::constants::{pool, simulator, tokens, BPS_DENOMINATOR};
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AmmConfig {
    /// Host-wide settings
    pub global: GlobalConfig,

    /// Pricing parameters of the pool
    pub pool: PoolSettings,

    /// Token display settings
    pub tokens: TokenSettings,
}

/// Global configuration settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GlobalConfig {
    pub log_level: String,
    pub state_file: PathBuf,
    pub json_logs: bool,
}

/// Pool pricing settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PoolSettings {
    pub fee_bps: u32,
    pub ratio_tolerance_bps: u32,
    pub default_slippage_bps: u32,
}

/// Token settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TokenSettings {
    pub decimals: u32,
    pub symbol_a: String,
    pub symbol_b: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: simulator::DEFAULT_LOG_LEVEL.to_string(),
            state_file: PathBuf::from(simulator::DEFAULT_STATE_FILE),
            json_logs: false,
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            fee_bps: pool::DEFAULT_FEE_BPS,
            ratio_tolerance_bps: pool::DEFAULT_RATIO_TOLERANCE_BPS,
            default_slippage_bps: pool::DEFAULT_SLIPPAGE_BPS,
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            decimals: tokens::DEFAULT_DECIMALS,
            symbol_a: tokens::TOKEN_A_SYMBOL.to_string(),
            symbol_b: tokens::TOKEN_B_SYMBOL.to_string(),
        }
    }
}

impl AmmConfig {
    /// Load configuration from files with environment overrides
    ///
    /// A missing `base_path` is an error; with no path, `config/amm.toml`
    /// is used if present and defaults otherwise.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        Self::load_with_prefix(base_path, environment, simulator::ENV_PREFIX)
    }

    fn load_with_prefix(
        base_path: Option<&Path>,
        environment: Option<&str>,
        env_prefix: &str,
    ) -> Result<Self> {
        let (base, required) = match base_path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from("config/amm.toml"), false),
        };

        let mut builder =
            Config::builder().add_source(File::from(base.as_path()).required(required));

        // Add environment-specific overrides if specified
        if let Some(env) = environment {
            let env_file = base
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (DUOSWAP_POOL__FEE_BPS=25)
        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AmmConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Reject values the engine would refuse later
    pub fn validate(&self) -> Result<()> {
        if self.pool.fee_bps >= BPS_DENOMINATOR {
            bail!(
                "pool.fee_bps must be below {}, got {}",
                BPS_DENOMINATOR,
                self.pool.fee_bps
            );
        }
        if self.pool.ratio_tolerance_bps > BPS_DENOMINATOR {
            bail!(
                "pool.ratio_tolerance_bps must be at most {}, got {}",
                BPS_DENOMINATOR,
                self.pool.ratio_tolerance_bps
            );
        }
        if self.pool.default_slippage_bps > BPS_DENOMINATOR {
            bail!(
                "pool.default_slippage_bps must be at most {}, got {}",
                BPS_DENOMINATOR,
                self.pool.default_slippage_bps
            );
        }
        if self.tokens.decimals > tokens::MAX_DECIMALS {
            bail!(
                "tokens.decimals must be at most {}, got {}",
                tokens::MAX_DECIMALS,
                self.tokens.decimals
            );
        }
        Ok(())
    }

    /// State file path with `~` and `$VAR` expanded
    pub fn state_file(&self) -> Result<PathBuf> {
        let raw = self.global.state_file.to_string_lossy();
        let expanded = shellexpand::full(&raw).context("Failed to expand state file path")?;
        Ok(PathBuf::from(expanded.as_ref()))
    }

    /// Effective configuration rendered as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(path: Option<&Path>, environment: Option<&str>) -> Result<AmmConfig> {
    AmmConfig::load(path, environment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_base_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("amm.toml");

        let config_content = r#"
[global]
log_level = "debug"
state_file = "/tmp/duoswap/pool.json"

[pool]
fee_bps = 25
"#;

        fs::write(&config_path, config_content).unwrap();

        let config =
            AmmConfig::load_with_prefix(Some(&config_path), None, "DUOSWAP_TEST_BASE").unwrap();

        assert_eq!(config.global.log_level, "debug");
        assert_eq!(config.pool.fee_bps, 25);
        // unspecified keys keep their defaults
        assert_eq!(config.pool.ratio_tolerance_bps, 100);
        assert_eq!(config.tokens.symbol_b, "TKB");
        assert_eq!(
            config.state_file().unwrap(),
            PathBuf::from("/tmp/duoswap/pool.json")
        );
    }

    #[test]
    fn test_missing_required_file_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(AmmConfig::load_with_prefix(Some(&missing), None, "DUOSWAP_TEST_MISSING").is_err());
    }

    #[test]
    fn test_environment_overlay() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("amm.toml");
        fs::write(&config_path, "[pool]\nfee_bps = 30\n").unwrap();
        fs::create_dir(dir.path().join("environments")).unwrap();
        fs::write(
            dir.path().join("environments").join("testnet.toml"),
            "[pool]\nratio_tolerance_bps = 250\n",
        )
        .unwrap();

        let config = AmmConfig::load_with_prefix(
            Some(&config_path),
            Some("testnet"),
            "DUOSWAP_TEST_OVERLAY",
        )
        .unwrap();
        assert_eq!(config.pool.fee_bps, 30);
        assert_eq!(config.pool.ratio_tolerance_bps, 250);
    }

    #[test]
    fn test_environment_variable_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("amm.toml");
        fs::write(&config_path, "[pool]\nfee_bps = 30\n").unwrap();

        std::env::set_var("DUOSWAP_TEST_ENVVAR_POOL__FEE_BPS", "5");
        let config =
            AmmConfig::load_with_prefix(Some(&config_path), None, "DUOSWAP_TEST_ENVVAR").unwrap();
        std::env::remove_var("DUOSWAP_TEST_ENVVAR_POOL__FEE_BPS");

        assert_eq!(config.pool.fee_bps, 5);
    }

    #[test]
    fn test_invalid_fee_rejected() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("amm.toml");
        fs::write(&config_path, "[pool]\nfee_bps = 10000\n").unwrap();

        let err = AmmConfig::load_with_prefix(Some(&config_path), None, "DUOSWAP_TEST_INVALID")
            .unwrap_err();
        assert!(err.to_string().contains("fee_bps"));
    }

    #[test]
    fn test_defaults_render_as_toml() {
        let rendered = AmmConfig::default().to_toml().unwrap();
        assert!(rendered.contains("fee_bps = 30"));
        assert!(rendered.contains("symbol_a = \"TKA\""));
    }

    #[test]
    fn test_defaults_match_engine_pool() {
        let engine_pool = duoswap_amm::PoolConfig::default();
        let settings = PoolSettings::default();
        assert_eq!(settings.fee_bps, engine_pool.fee_bps);
        assert_eq!(settings.ratio_tolerance_bps, engine_pool.ratio_tolerance_bps);
        assert_eq!(TokenSettings::default().decimals, 18);
        assert!(tokens::DEFAULT_DECIMALS <= tokens::MAX_DECIMALS);
    }
}

//! DuoSwap pool simulator
//!
//! Runs one command against the pool kept in the state file. Every mutation
//! attempt is written back, since a rejected operation still takes its
//! journal sequence number.

use amm_simulator::{read_journal, SlippageGuard, Simulator, StateStore, StoredPool};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use duoswap_amm::Direction;
use duoswap_config::AmmConfig;
use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "amm_sim")]
#[command(about = "Two-token constant product pool simulator")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to config/amm.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Environment overlay from config/environments/<NAME>.toml
    #[arg(long = "env", global = true)]
    environment: Option<String>,

    /// Pool state file, overrides global.state_file
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// JSON logs and JSON command output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty pool state file
    Init {
        /// Replace an existing state file
        #[arg(short, long)]
        force: bool,
    },
    /// Deposit both tokens
    AddLiquidity {
        /// Amount of token A
        amount_a: String,
        /// Amount of token B
        amount_b: String,
    },
    /// Trade one token for the other
    Swap {
        /// a-to-b or b-to-a
        direction: Direction,
        /// Input amount
        amount: String,
        /// Reject the swap below this output
        #[arg(long, conflicts_with = "slippage_bps")]
        min_out: Option<String>,
        /// Derive the minimum output from a fresh quote
        #[arg(long)]
        slippage_bps: Option<u32>,
    },
    /// Price a trade without executing it
    Quote {
        /// a-to-b or b-to-a
        direction: Direction,
        /// Input amount
        amount: String,
    },
    /// Withdraw liquidity
    RemoveLiquidity {
        /// Shares to burn
        shares: String,
    },
    /// Apply a JSON journal of sequenced operations (base units)
    Replay {
        /// File holding `[{"sequence": N, "operation": {...}}, ...]`
        journal: PathBuf,
    },
    /// Show reserves, rates and composition
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AmmConfig::load(cli.config.as_deref(), cli.environment.as_deref())?;
    init_tracing(&config, cli.json)?;

    let state_path = match &cli.state {
        Some(path) => path.clone(),
        None => config.state_file()?,
    };
    let store = StateStore::new(state_path);
    debug!(state_file = ?store.path(), "Using state file");

    if let Commands::Init { force } = cli.command {
        if store.exists() && !force {
            bail!(
                "State file {:?} already exists (use --force to replace it)",
                store.path()
            );
        }
        let stored = StoredPool {
            last_sequence: 0,
            pool: Simulator::empty_pool(&config),
        };
        store.save(&stored)?;
        info!(fee_bps = stored.pool.config.fee_bps, "Initialized empty pool");
        let text = format!("Initialized empty pool at {:?}", store.path());
        return emit(cli.json, &stored, &text);
    }

    let stored = store.load()?;
    let simulator = Simulator::new(config, stored)?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::AddLiquidity { amount_a, amount_b } => {
            let result = simulator.add_liquidity(&amount_a, &amount_b);
            store.save(&simulator.stored())?;
            let report = result?;
            emit(cli.json, &report, &report)
        }
        Commands::Swap {
            direction,
            amount,
            min_out,
            slippage_bps,
        } => {
            let guard = match (min_out, slippage_bps) {
                (Some(min_out), _) => SlippageGuard::MinOut(min_out),
                (None, Some(bps)) => SlippageGuard::Tolerance(bps),
                (None, None) => SlippageGuard::None,
            };
            let result = simulator.swap(direction, &amount, guard);
            store.save(&simulator.stored())?;
            let report = result?;
            emit(cli.json, &report, &report)
        }
        Commands::Quote { direction, amount } => {
            let report = simulator.quote(direction, &amount)?;
            emit(cli.json, &report, &report)
        }
        Commands::RemoveLiquidity { shares } => {
            let result = simulator.remove_liquidity(&shares);
            store.save(&simulator.stored())?;
            let (amount_a, amount_b) = result?;
            let text = format!("Withdrew {} A and {} B", amount_a, amount_b);
            emit(cli.json, &(amount_a, amount_b), &text)
        }
        Commands::Replay { journal } => {
            let entries = read_journal(&journal)?;
            // entries before a gap stay committed
            let result = simulator.replay(entries);
            store.save(&simulator.stored())?;
            let summary = result?;
            let text = format!(
                "Replayed {} operations ({} rejected), journal at {}",
                summary.committed + summary.rejected,
                summary.rejected,
                summary.last_sequence
            );
            emit(cli.json, &summary, &text)
        }
        Commands::Status => {
            let report = simulator.status();
            emit(cli.json, &report, &report)
        }
    }
}

fn init_tracing(config: &AmmConfig, json: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(
        config
            .global
            .log_level
            .parse()
            .with_context(|| format!("Invalid log level '{}'", config.global.log_level))?,
    );

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json || config.global.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn emit<T: Serialize>(json: bool, value: &T, text: &dyn Display) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text);
    }
    Ok(())
}

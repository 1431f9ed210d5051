//! Tradepost catalog tool
//!
//! Usage:
//!   tradepost inspect --datasets ./Market/Datasets
//!   tradepost resolve --datasets ./Market/Datasets --setups ./Market/Setups --item AKM --setup Trader_A
//!   tradepost simulate --datasets ./Market/Datasets --ceiling 2000

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;
use tradepost_catalog::CatalogStore;
use tradepost_cli::{inspect_report, resolve_report, simulate};
use tradepost_setup::SetupResolver;
use tradepost_sync::{MAX_PAYLOAD_BYTES, SyncConfig, load_warn_text};

#[derive(Parser, Debug)]
#[command(name = "tradepost")]
#[command(about = "Inspect Tradepost catalogs, resolve trader modes and simulate client sync")]
struct Args {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every dataset with its categories and item counts
    Inspect {
        /// Directory holding dataset JSON files
        #[arg(short, long)]
        datasets: PathBuf,
    },

    /// Resolve the trade mode of an item against override sets
    Resolve {
        /// Directory holding dataset JSON files
        #[arg(short, long)]
        datasets: PathBuf,

        /// Directories searched for <setup>.json, in order
        #[arg(long = "setups", required = true)]
        setup_dirs: Vec<PathBuf>,

        /// Item classname
        #[arg(short, long)]
        item: String,

        /// Override set names, in trader order
        #[arg(short, long = "setup", required = true)]
        setups: Vec<String>,
    },

    /// Serve the catalog to an in-process client and print what it rebuilt
    Simulate {
        /// Directory holding dataset JSON files
        #[arg(short, long)]
        datasets: PathBuf,

        /// Payload ceiling in bytes
        #[arg(long, default_value_t = MAX_PAYLOAD_BYTES)]
        ceiling: usize,

        /// Client stall timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,

        /// Market config files to read WarnText from, in order
        #[arg(long = "market-config")]
        market_configs: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    match args.command {
        Command::Inspect { datasets } => {
            let store = load_store(&datasets)?;
            print!("{}", inspect_report(&store));
        }
        Command::Resolve {
            datasets,
            setup_dirs,
            item,
            setups,
        } => {
            let store = load_store(&datasets)?;
            let resolver = SetupResolver::new(setup_dirs);
            println!("{}", resolve_report(&store, &resolver, &item, &setups));
        }
        Command::Simulate {
            datasets,
            ceiling,
            timeout,
            market_configs,
        } => {
            let store = load_store(&datasets)?;
            let config = SyncConfig {
                payload_ceiling: ceiling,
                sync_timeout: Duration::from_secs(timeout),
                warn_text: load_warn_text(&market_configs).unwrap_or_default(),
            };
            let report = simulate(store, config).await?;
            print!("{report}");
        }
    }
    Ok(())
}

fn load_store(dir: &Path) -> Result<CatalogStore> {
    let mut store = CatalogStore::new();
    let count = store
        .load_dir(dir)
        .with_context(|| format!("Failed to load datasets from {}", dir.display()))?;
    info!("Loaded {} datasets", count);
    Ok(store)
}

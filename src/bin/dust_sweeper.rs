//! CLI entrypoint for the dust sweeper.
//! Loads configuration from `.env`, the environment and an optional TOML file,
//! checks the node, then polls forever (or once with `--once`).

use anyhow::Result;
use clap::Parser;
use dust_sweeper::blockchain::{EthplorerClient, Web3Client};
use dust_sweeper::config::Config;
use dust_sweeper::engine::DustSweeper;
use dust_sweeper::utils::init_logging;
use log::error;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "dust-sweeper",
    author,
    version,
    about = "Sweep ERC-20 dust to a sink address",
    long_about = None
)]
struct Args {
    /// Optional TOML configuration file; environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Print the default configuration to stdout and exit
    #[arg(long)]
    print_default_config: bool,

    /// Log level (overridden by DUST_SWEEPER_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Config and connectivity failures end the process with status 1 before polling starts
fn startup<T>(result: dust_sweeper::Result<T>) -> Result<T> {
    match result {
        | Ok(value) => Ok(value),
        | Err(e) if e.is_startup_fatal() => {
            error!("{}", e);
            process::exit(1);
        }
        | Err(e) => Err(e.into()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logging(&args.log_level);

    if args.print_default_config {
        println!("{}", Config::default_toml()?);
        return Ok(());
    }

    let config = startup(
        Config::load(args.config.as_deref()).and_then(|c| c.validate().map(|_| c)),
    )?;
    let chain = Arc::new(startup(Web3Client::connect(&config.network.rpc_url).await)?);
    let balances = Arc::new(EthplorerClient::new(&config.balance_api)?);

    let sweeper = startup(DustSweeper::new(&config, balances, chain))?;
    startup(sweeper.preflight())?;

    if args.once {
        sweeper.run_once().await?;
        return Ok(());
    }
    sweeper.run().await;
    Ok(())
}

//! Polling loop: fetch balances, pick dust, build transfers, optionally broadcast, sleep.

use super::dust_filter::filter_dust;
use super::sleeper::{Sleeper, TokioSleeper};
use crate::blockchain::{BalanceSource, ChainClient, TokenUtils, TransferBuilder};
use crate::config::{Config, SubmissionMode};
use crate::utils::error::{Error, Result};
use crate::utils::types::{CycleReport, GasParams};
use crate::wallet::{EnvKeyProvider, KeyProvider};
use log::{error, info};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use web3::types::{Address, U256};

/// Drives the sweep cycle forever
pub struct DustSweeper {
    balances: Arc<dyn BalanceSource>,
    chain: Arc<dyn ChainClient>,
    keys: Arc<dyn KeyProvider>,
    sleeper: Arc<dyn Sleeper>,
    wallet: Address,
    sink: Address,
    threshold: Decimal,
    interval: Duration,
    mode: SubmissionMode,
    builder: TransferBuilder,
}

impl DustSweeper {
    /// Create a sweeper from a validated configuration
    pub fn new(
        config: &Config,
        balances: Arc<dyn BalanceSource>,
        chain: Arc<dyn ChainClient>,
    ) -> Result<Self> {
        let wallet = config.wallet_address()?;
        let sink = config.sink_address()?;
        let gas = GasParams {
            limit: U256::from(config.sweep.gas_limit),
            price: config.gas_price_wei()?,
        };

        Ok(Self {
            balances,
            chain,
            keys: Arc::new(EnvKeyProvider::new(config.wallet.private_key_var.clone())),
            sleeper: Arc::new(TokioSleeper),
            wallet,
            sink,
            threshold: config.sweep.threshold_eth,
            interval: config.poll_interval(),
            mode: config.sweep.submission_mode,
            builder: TransferBuilder::new(sink, gas, config.sweep.amount_scaling),
        })
    }

    /// Replace the sleeper used between cycles
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replace where the signing key comes from
    pub fn with_key_provider(mut self, keys: Arc<dyn KeyProvider>) -> Self {
        self.keys = keys;
        self
    }

    /// Startup checks run before the loop. In live mode the key must control the wallet.
    pub fn preflight(&self) -> Result<()> {
        info!(
            "Starting dust sweeper for {} on chain {}. Threshold: {} ETH, interval: {}s, mode: {}",
            TokenUtils::to_checksum_address(&self.wallet),
            self.chain.chain_id(),
            self.threshold,
            self.interval.as_secs(),
            self.mode
        );
        info!("Sink address: {}", TokenUtils::to_checksum_address(&self.sink));

        if self.mode.is_live() {
            let key = self.keys.load().map_err(|e| Error::ConfigError(e.to_string()))?;
            let derived = key.address().map_err(|e| Error::ConfigError(e.to_string()))?;
            if derived != self.wallet {
                return Err(Error::ConfigError(format!(
                    "Private key controls {}, not the configured wallet {}",
                    TokenUtils::to_checksum_address(&derived),
                    TokenUtils::to_checksum_address(&self.wallet)
                )));
            }
        }
        Ok(())
    }

    /// One polling phase. Errors propagate to the caller.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let holdings = self.balances.fetch_holdings(&self.wallet).await?;
        let dust = filter_dust(&holdings, self.threshold);
        let mut report = CycleReport {
            holdings_seen: holdings.len(),
            dust_found: dust.len(),
            ..CycleReport::default()
        };

        if dust.is_empty() {
            info!("No dust found among {} holdings", holdings.len());
            return Ok(report);
        }

        info!("Found {} dust tokens:", dust.len());
        for holding in &dust {
            info!(
                " • {}: balance={}, ≈{:.6} ETH",
                holding.symbol, holding.balance, holding.value_native
            );
        }

        let nonce = self.chain.next_nonce(self.wallet).await?;
        let transfers = self.builder.build_transfers(&dust, nonce)?;
        report.transfers_built = transfers.len();

        match self.mode {
            | SubmissionMode::DryRun => {
                for transfer in &transfers {
                    info!(
                        "   > dry-run: transfer {} {} to {} (nonce {})",
                        transfer.amount,
                        transfer.symbol,
                        TokenUtils::to_checksum_address(&transfer.recipient),
                        transfer.nonce
                    );
                }
            }
            | SubmissionMode::Live => {
                let key = self.keys.load()?;
                for transfer in &transfers {
                    let hash = self.chain.submit_transfer(transfer, &key).await?;
                    info!(
                        "   > sent {} {} to {} (nonce {}): {:?}",
                        transfer.amount,
                        transfer.symbol,
                        TokenUtils::to_checksum_address(&transfer.recipient),
                        transfer.nonce,
                        hash
                    );
                    report.submitted.push(hash);
                }
            }
        }
        Ok(report)
    }

    /// Run one cycle and log its summary, without sleeping afterwards
    pub async fn run_once(&self) -> Result<CycleReport> {
        let report = self.run_cycle().await?;
        info!(
            "Cycle done: {} holdings, {} dust, {} built, {} submitted",
            report.holdings_seen,
            report.dust_found,
            report.transfers_built,
            report.submitted.len()
        );
        Ok(report)
    }

    /// Poll once, log the outcome, then sleep the configured interval whatever happened.
    pub async fn tick(&self) -> CycleReport {
        let report = match self.run_once().await {
            | Ok(report) => report,
            | Err(e) => {
                error!("Cycle failed: {}", e);
                CycleReport::default()
            }
        };
        self.sleeper.sleep(self.interval).await;
        report
    }

    /// Run until the process is terminated
    pub async fn run(&self) {
        loop {
            self.tick().await;
        }
    }
}

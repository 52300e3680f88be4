//! Configuration module for the dust sweeper

use crate::blockchain::TokenUtils;
use crate::utils::error::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use web3::types::{Address, U256};

/// Default Ethplorer API base URL
pub const DEFAULT_BALANCE_API_URL: &str = "https://api.ethplorer.io";
/// Environment variable the signing key is read from by default
pub const DEFAULT_PRIVATE_KEY_VAR: &str = "PRIVATE_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON-RPC node configuration
    pub network: NetworkConfig,

    /// Balance indexing API configuration
    pub balance_api: BalanceApiConfig,

    /// Wallet configuration
    pub wallet: WalletConfig,

    /// Sweep policy
    pub sweep: SweepConfig,
}

/// JSON-RPC node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// RPC endpoint URL
    pub rpc_url: String,
}

/// Balance indexing API (Ethplorer) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceApiConfig {
    /// API base URL
    #[serde(default = "default_balance_api_url")]
    pub api_url: String,

    /// API key
    pub api_key: String,

    /// Timeout for balance requests in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Wallet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Account scanned for dust
    pub address: String,

    /// Destination for swept dust
    pub sink_address: String,

    /// Name of the environment variable holding the hex private key.
    /// The key itself never lives in the config.
    #[serde(default = "default_private_key_var")]
    pub private_key_var: String,
}

/// Sweep policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Dust cutoff in native currency (ETH)
    #[serde(default = "default_threshold_eth")]
    pub threshold_eth: Decimal,

    /// Cycle period in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Whether built transfers are broadcast
    #[serde(default)]
    pub submission_mode: SubmissionMode,

    /// How the transferred amount is derived from the held balance
    #[serde(default)]
    pub amount_scaling: AmountScaling,

    /// Gas limit per transfer
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,

    /// Gas price in gwei
    #[serde(default = "default_gas_price_gwei")]
    pub gas_price_gwei: Decimal,
}

/// Whether built transfers are only logged or actually signed and broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionMode {
    /// Log the transfers, never broadcast
    #[default]
    DryRun,
    /// Sign and broadcast every built transfer
    Live,
}

impl SubmissionMode {
    pub fn is_live(self) -> bool {
        self == SubmissionMode::Live
    }
}

impl FromStr for SubmissionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            | "dry-run" | "dry_run" | "dryrun" => Ok(SubmissionMode::DryRun),
            | "live" => Ok(SubmissionMode::Live),
            | other => Err(Error::ConfigError(format!(
                "Unknown submission mode {:?} (expected dry-run or live)",
                other
            ))),
        }
    }
}

impl fmt::Display for SubmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            | SubmissionMode::DryRun => write!(f, "dry-run"),
            | SubmissionMode::Live => write!(f, "live"),
        }
    }
}

/// How the transferred amount relates to the held balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountScaling {
    /// Transfer the raw balance in the token's own smallest unit
    #[default]
    Exact,
    /// Re-scale the display balance by 10^18 regardless of the token's decimals.
    /// Over-sends (and reverts) for tokens with fewer than 18 decimals.
    Legacy18,
}

impl FromStr for AmountScaling {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            | "exact" => Ok(AmountScaling::Exact),
            | "legacy18" | "legacy-18" | "legacy" => Ok(AmountScaling::Legacy18),
            | other => Err(Error::ConfigError(format!(
                "Unknown amount scaling {:?} (expected exact or legacy18)",
                other
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig { rpc_url: String::new() },
            balance_api: BalanceApiConfig::default(),
            wallet: WalletConfig::default(),
            sweep: SweepConfig::default(),
        }
    }
}

impl Default for BalanceApiConfig {
    fn default() -> Self {
        Self {
            api_url: default_balance_api_url(),
            api_key: String::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            sink_address: String::new(),
            private_key_var: default_private_key_var(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            threshold_eth: default_threshold_eth(),
            poll_interval_secs: default_poll_interval_secs(),
            submission_mode: SubmissionMode::default(),
            amount_scaling: AmountScaling::default(),
            gas_limit: default_gas_limit(),
            gas_price_gwei: default_gas_price_gwei(),
        }
    }
}

// --------- Helper default functions for serde ---------
fn default_balance_api_url() -> String {
    DEFAULT_BALANCE_API_URL.to_string()
}
fn default_timeout_seconds() -> u64 {
    30
}
fn default_private_key_var() -> String {
    DEFAULT_PRIVATE_KEY_VAR.to_string()
}
fn default_threshold_eth() -> Decimal {
    dec!(0.01)
}
fn default_poll_interval_secs() -> u64 {
    600
}
fn default_gas_limit() -> u64 {
    100_000
}
fn default_gas_price_gwei() -> Decimal {
    dec!(10)
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::ConfigError(format!("Invalid value for {}: {:?} ({})", name, value, e)))
}

impl Config {
    /// Serialize default config to TOML string
    pub fn default_toml() -> Result<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::ConfigError(format!("Failed to read config file {:?}: {}", path.as_ref(), e))
        })?;
        let mut cfg: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;
        cfg.merge_env()?;
        Ok(cfg)
    }

    /// Configuration from defaults plus environment variables only
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.merge_env()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise from the environment
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        match path {
            | Some(p) => Self::from_file(p),
            | None => Self::from_env(),
        }
    }

    /// Merge environment variables into the configuration
    pub fn merge_env(&mut self) -> Result<()> {
        if let Ok(rpc_url) = env::var("ETH_RPC_URL") {
            self.network.rpc_url = rpc_url;
        }
        if let Ok(api_key) = env::var("ETHPLORER_API_KEY") {
            self.balance_api.api_key = api_key;
        }
        if let Ok(api_url) = env::var("ETHPLORER_API_URL") {
            self.balance_api.api_url = api_url;
        }
        if let Ok(timeout) = env::var("HTTP_TIMEOUT_SECS") {
            self.balance_api.timeout_seconds = parse_env("HTTP_TIMEOUT_SECS", &timeout)?;
        }
        if let Ok(address) = env::var("WALLET_ADDRESS") {
            self.wallet.address = address;
        }
        if let Ok(sink) = env::var("SINK_ADDRESS") {
            self.wallet.sink_address = sink;
        }
        if let Ok(threshold) = env::var("THRESHOLD_ETH") {
            self.sweep.threshold_eth = parse_env("THRESHOLD_ETH", &threshold)?;
        }
        if let Ok(interval) = env::var("POLL_INTERVAL") {
            self.sweep.poll_interval_secs = parse_env("POLL_INTERVAL", &interval)?;
        }
        if let Ok(mode) = env::var("SUBMISSION_MODE") {
            self.sweep.submission_mode = mode.parse()?;
        }
        if let Ok(scaling) = env::var("AMOUNT_SCALING") {
            self.sweep.amount_scaling = scaling.parse()?;
        }
        if let Ok(gas_limit) = env::var("GAS_LIMIT") {
            self.sweep.gas_limit = parse_env("GAS_LIMIT", &gas_limit)?;
        }
        if let Ok(gas_price) = env::var("GAS_PRICE_GWEI") {
            self.sweep.gas_price_gwei = parse_env("GAS_PRICE_GWEI", &gas_price)?;
        }
        Ok(())
    }

    /// Validate the configuration for required fields and reasonable values
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.network.rpc_url.trim().is_empty() {
            missing.push("ETH_RPC_URL");
        }
        if self.balance_api.api_key.trim().is_empty() {
            missing.push("ETHPLORER_API_KEY");
        }
        if self.wallet.address.trim().is_empty() {
            missing.push("WALLET_ADDRESS");
        }
        if self.wallet.sink_address.trim().is_empty() {
            missing.push("SINK_ADDRESS");
        }
        if !missing.is_empty() {
            return Err(Error::ConfigError(format!(
                "Required settings missing: {}",
                missing.join(", ")
            )));
        }

        url::Url::parse(&self.network.rpc_url)
            .map_err(|e| Error::ConfigError(format!("Invalid ETH_RPC_URL: {}", e)))?;
        url::Url::parse(&self.balance_api.api_url)
            .map_err(|e| Error::ConfigError(format!("Invalid ETHPLORER_API_URL: {}", e)))?;
        self.wallet_address()?;
        self.sink_address()?;

        if self.sweep.threshold_eth <= Decimal::ZERO {
            return Err(Error::ConfigError("THRESHOLD_ETH must be > 0".to_string()));
        }
        if self.sweep.poll_interval_secs == 0 {
            return Err(Error::ConfigError("POLL_INTERVAL must be > 0".to_string()));
        }
        if self.balance_api.timeout_seconds == 0 {
            return Err(Error::ConfigError("HTTP_TIMEOUT_SECS must be > 0".to_string()));
        }
        if self.sweep.gas_limit == 0 {
            return Err(Error::ConfigError("GAS_LIMIT must be > 0".to_string()));
        }
        self.gas_price_wei()?;

        if self.sweep.submission_mode.is_live() {
            match env::var(&self.wallet.private_key_var) {
                | Ok(key) if !key.trim().is_empty() => {}
                | _ => {
                    return Err(Error::ConfigError(format!(
                        "SUBMISSION_MODE=live requires {} to be set",
                        self.wallet.private_key_var
                    )))
                }
            }
        }
        Ok(())
    }

    /// Scanned wallet address
    pub fn wallet_address(&self) -> Result<Address> {
        TokenUtils::parse_address(&self.wallet.address)
            .map_err(|e| Error::ConfigError(format!("Invalid WALLET_ADDRESS: {}", e)))
    }

    /// Sink address
    pub fn sink_address(&self) -> Result<Address> {
        TokenUtils::parse_address(&self.wallet.sink_address)
            .map_err(|e| Error::ConfigError(format!("Invalid SINK_ADDRESS: {}", e)))
    }

    /// Gas price in wei
    pub fn gas_price_wei(&self) -> Result<U256> {
        TokenUtils::gwei_to_wei(self.sweep.gas_price_gwei)
    }

    /// Sleep between cycles
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.sweep.poll_interval_secs)
    }
}

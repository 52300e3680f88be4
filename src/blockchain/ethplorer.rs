//! Ethplorer balance fetcher.
//!
//! One `getAddressInfo` request per cycle returns every ERC-20 balance of the
//! wallet together with USD quotes for the tokens and for ETH. Token values are
//! expressed in ETH by dividing the USD value by the ETH quote; without an ETH
//! quote every value is zero, which keeps unpriced tokens out of the dust set.

use super::token_utils::TokenUtils;
use crate::config::BalanceApiConfig;
use crate::utils::error::{Error, Result};
use crate::utils::types::TokenHolding;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use web3::types::{Address, U256};

/// Source of the wallet's token holdings
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Fetch every token holding of `address`, valued in native currency
    async fn fetch_holdings(&self, address: &Address) -> Result<Vec<TokenHolding>>;
}

/// Client for the Ethplorer `getAddressInfo` endpoint
pub struct EthplorerClient {
    client: Client,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct AddressInfo {
    #[serde(rename = "ETH", default)]
    eth: Option<NativeInfo>,
    #[serde(default)]
    tokens: Vec<TokenEntry>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NativeInfo {
    #[serde(default)]
    price: Option<PriceField>,
}

#[derive(Debug, Deserialize)]
struct TokenEntry {
    #[serde(rename = "tokenInfo")]
    token_info: TokenInfo,
    #[serde(default)]
    balance: Option<f64>,
    #[serde(rename = "rawBalance", default)]
    raw_balance: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    address: String,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    decimals: Option<NumberOrString>,
    #[serde(default)]
    price: Option<PriceField>,
}

/// Ethplorer reports `"price": false` for unpriced assets; `null` and a missing
/// field deserialize to `None` on the holder. All three mean no quote.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceField {
    Quote {
        #[serde(default)]
        rate: Option<f64>,
    },
    Flag(bool),
}

/// Quoted USD rate, zero when the asset is unpriced
fn quoted_rate(price: Option<&PriceField>) -> Decimal {
    match price {
        | Some(PriceField::Quote { rate: Some(rate) }) => {
            Decimal::from_f64(*rate).filter(|r| r.is_sign_positive()).unwrap_or(Decimal::ZERO)
        }
        | _ => Decimal::ZERO,
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

impl NumberOrString {
    fn as_u32(&self) -> Option<u32> {
        match self {
            | NumberOrString::Number(n) => u32::try_from(*n).ok(),
            | NumberOrString::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl EthplorerClient {
    /// Create a new Ethplorer client
    pub fn new(config: &BalanceApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl BalanceSource for EthplorerClient {
    async fn fetch_holdings(&self, address: &Address) -> Result<Vec<TokenHolding>> {
        let url = format!(
            "{}/getAddressInfo/{}",
            self.api_url,
            TokenUtils::to_checksum_address(address)
        );
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::ConnectionError(format!(
                "Balance API returned HTTP {}: {}",
                status,
                truncate(&body, 200)
            )));
        }
        parse_address_info(&body)
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        | Some((idx, _)) => &text[..idx],
        | None => text,
    }
}

/// Parse a `getAddressInfo` body into valued holdings, in API order.
pub fn parse_address_info(body: &str) -> Result<Vec<TokenHolding>> {
    let info: AddressInfo = serde_json::from_str(body)
        .map_err(|e| Error::DataError(format!("Malformed balance API response: {}", e)))?;

    if let Some(err) = info.error {
        return Err(Error::DataError(format!(
            "Balance API error {}: {}",
            err.code.map(|c| c.to_string()).unwrap_or_else(|| "?".into()),
            err.message.unwrap_or_default()
        )));
    }

    let native_price = quoted_rate(info.eth.as_ref().and_then(|eth| eth.price.as_ref()));
    if native_price.is_zero() {
        warn!("Balance API returned no ETH price; all token values treated as 0");
    }

    let mut holdings = Vec::with_capacity(info.tokens.len());
    for entry in info.tokens {
        match holding_from_entry(entry, native_price) {
            | Ok(holding) => holdings.push(holding),
            | Err(e) => warn!("Skipping token entry: {}", e),
        }
    }
    Ok(holdings)
}

fn holding_from_entry(entry: TokenEntry, native_price: Decimal) -> Result<TokenHolding> {
    let info = entry.token_info;
    let contract = TokenUtils::parse_address(&info.address)?;
    let decimals = info
        .decimals
        .as_ref()
        .and_then(NumberOrString::as_u32)
        .ok_or_else(|| Error::DataError(format!("Token {} has no usable decimals", info.address)))?;

    let raw_balance = match (entry.raw_balance.as_deref(), entry.balance) {
        | (Some(raw), _) => TokenUtils::parse_raw_amount(raw)?,
        | (None, Some(balance)) => TokenUtils::float_to_raw_amount(balance)?,
        | (None, None) => U256::zero(),
    };
    let balance = TokenUtils::format_token_amount(raw_balance, decimals);
    let token_price = quoted_rate(info.price.as_ref());
    let value_native = estimate_native_value(balance, token_price, native_price);

    Ok(TokenHolding {
        symbol: info.symbol.filter(|s| !s.trim().is_empty()).unwrap_or_else(|| "?".to_string()),
        contract,
        raw_balance,
        decimals,
        balance,
        value_native,
    })
}

/// `balance * token_price / native_price`, zero when the native price is unknown.
/// Values too large to represent saturate, which keeps them out of the dust set.
pub fn estimate_native_value(
    balance: Decimal,
    token_price: Decimal,
    native_price: Decimal,
) -> Decimal {
    if native_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    balance
        .checked_mul(token_price)
        .and_then(|usd| usd.checked_div(native_price))
        .unwrap_or(Decimal::MAX)
}

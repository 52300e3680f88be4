//! Common types used throughout the dust sweeper.

use rust_decimal::Decimal;
use web3::types::{Address, Bytes, H256, U256};

/// A token balance held by the scanned wallet, valued in the native currency.
/// Rebuilt from the balance API every cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenHolding {
    /// Token symbol as reported by the indexer
    pub symbol: String,
    /// Token contract address
    pub contract: Address,
    /// Balance in the token's smallest unit
    pub raw_balance: U256,
    /// Token decimal count
    pub decimals: u32,
    /// `raw_balance / 10^decimals`
    pub balance: Decimal,
    /// Estimated value in native currency (ETH); zero when unpriced
    pub value_native: Decimal,
}

/// Gas parameters attached to every transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasParams {
    /// Gas limit
    pub limit: U256,
    /// Gas price in wei
    pub price: U256,
}

/// An unsigned ERC-20 `transfer` call sweeping one holding to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    /// Token symbol, for logging
    pub symbol: String,
    /// Token contract the call is sent to
    pub token: Address,
    /// Recipient of the tokens (the sink)
    pub recipient: Address,
    /// Amount in the token's smallest unit
    pub amount: U256,
    /// Account nonce
    pub nonce: U256,
    /// Gas limit and price
    pub gas: GasParams,
    /// ABI-encoded `transfer(recipient, amount)` call data
    pub data: Bytes,
}

/// Summary of one polling cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Holdings returned by the balance API
    pub holdings_seen: usize,
    /// Holdings classified as dust
    pub dust_found: usize,
    /// Transfers built
    pub transfers_built: usize,
    /// Hashes of broadcast transactions (empty in dry-run)
    pub submitted: Vec<H256>,
}

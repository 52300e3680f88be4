//! # dust_sweeper
//! Polls an EVM wallet through the Ethplorer balance API, picks out token
//! holdings worth less than a threshold in ETH, and sweeps them to a sink
//! address with ERC-20 `transfer` calls. Broadcasting is off unless the
//! submission mode is set to live.

pub use crate::utils::error::{Error, Result};

pub mod blockchain;
pub mod config;
pub mod engine;
pub mod utils;
pub mod wallet;

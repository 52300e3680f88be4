//! Blockchain interaction module

pub mod ethplorer;
pub mod node_client;
pub mod token_utils;
pub mod transaction_builder;

// Re-export for convenience
pub use ethplorer::{BalanceSource, EthplorerClient};
pub use node_client::{ChainClient, Web3Client};
pub use token_utils::TokenUtils;
pub use transaction_builder::{encode_transfer_call, TransferBuilder};

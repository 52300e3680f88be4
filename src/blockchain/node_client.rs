//! JSON-RPC node access: chain id, nonce lookup, signing and broadcast.

use crate::utils::error::{Error, Result};
use crate::utils::types::TransferRequest;
use crate::wallet::SigningKey;
use async_trait::async_trait;
use log::debug;
use web3::transports::Http;
use web3::types::{Address, BlockNumber, H256, U256};
use web3::Web3;

/// Operations the sweeper needs from an EVM node
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain id used for EIP-155 signatures
    fn chain_id(&self) -> u64;

    /// Next nonce for `address`, counting pending transactions
    async fn next_nonce(&self, address: Address) -> Result<U256>;

    /// Sign `transfer` with `key` and broadcast it, returning the transaction hash
    async fn submit_transfer(&self, transfer: &TransferRequest, key: &SigningKey) -> Result<H256>;
}

/// `ChainClient` over a `web3` HTTP transport
pub struct Web3Client {
    web3: Web3<Http>,
    chain_id: u64,
}

impl Web3Client {
    /// Connect to `rpc_url` and read the chain id. Any failure is a connectivity error.
    pub async fn connect(rpc_url: &str) -> Result<Self> {
        let transport = Http::new(rpc_url)
            .map_err(|e| {
                Error::ConnectionError(format!("Invalid RPC endpoint {}: {}", rpc_url, e))
            })?;
        let web3 = Web3::new(transport);
        let chain_id = web3
            .eth()
            .chain_id()
            .await
            .map_err(|e| Error::ConnectionError(format!("RPC node unreachable: {}", e)))?;
        if chain_id > U256::from(u64::MAX) {
            return Err(Error::ConnectionError(format!("Unsupported chain id {}", chain_id)));
        }
        Ok(Self { web3, chain_id: chain_id.as_u64() })
    }
}

#[async_trait]
impl ChainClient for Web3Client {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn next_nonce(&self, address: Address) -> Result<U256> {
        let nonce = self
            .web3
            .eth()
            .transaction_count(address, Some(BlockNumber::Pending))
            .await?;
        debug!("Next nonce for {:?}: {}", address, nonce);
        Ok(nonce)
    }

    async fn submit_transfer(&self, transfer: &TransferRequest, key: &SigningKey) -> Result<H256> {
        let params = transfer.to_transaction_parameters(self.chain_id);
        let signed = {
            let secret = key.secret_key()?;
            self.web3.accounts().sign_transaction(params, &secret).await?
        };
        debug!("Signed {} transfer, hash {:?}", transfer.symbol, signed.transaction_hash);
        let hash = self.web3.eth().send_raw_transaction(signed.raw_transaction).await?;
        Ok(hash)
    }
}

use super::token_utils::TokenUtils;
use crate::config::AmountScaling;
use crate::utils::error::Result;
use crate::utils::types::{GasParams, TokenHolding, TransferRequest};
use web3::ethabi::{self, Token};
use web3::types::{Address, Bytes, TransactionParameters, U256};

/// Selector of `transfer(address,uint256)`
pub const ERC20_TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// Encode the call data for `transfer(recipient, amount)`
pub fn encode_transfer_call(recipient: Address, amount: U256) -> Bytes {
    let mut data = ERC20_TRANSFER_SELECTOR.to_vec();
    data.extend(ethabi::encode(&[Token::Address(recipient), Token::Uint(amount)]));
    Bytes(data)
}

/// Builder for the sweep transfers of one cycle
pub struct TransferBuilder {
    sink: Address,
    gas: GasParams,
    scaling: AmountScaling,
}

impl TransferBuilder {
    /// Create a new transfer builder
    pub fn new(sink: Address, gas: GasParams, scaling: AmountScaling) -> Self {
        Self { sink, gas, scaling }
    }

    /// One transfer per holding, nonces `start_nonce..start_nonce + n` in iteration order.
    ///
    /// Holdings are not reordered; the balance API's order decides which token gets
    /// which nonce.
    pub fn build_transfers(
        &self, dust: &[TokenHolding], start_nonce: U256,
    ) -> Result<Vec<TransferRequest>> {
        let mut nonce = start_nonce;
        let mut transfers = Vec::with_capacity(dust.len());
        for holding in dust {
            let amount =
                TokenUtils::transfer_amount(holding.raw_balance, holding.decimals, self.scaling)?;
            transfers.push(TransferRequest {
                symbol: holding.symbol.clone(),
                token: holding.contract,
                recipient: self.sink,
                amount,
                nonce,
                gas: self.gas,
                data: encode_transfer_call(self.sink, amount),
            });
            nonce += U256::one();
        }
        Ok(transfers)
    }
}

impl TransferRequest {
    /// Legacy (type 0) transaction parameters for signing on `chain_id`
    pub fn to_transaction_parameters(&self, chain_id: u64) -> TransactionParameters {
        TransactionParameters {
            nonce: Some(self.nonce),
            to: Some(self.token),
            gas: self.gas.limit,
            gas_price: Some(self.gas.price),
            value: U256::zero(),
            data: self.data.clone(),
            chain_id: Some(chain_id),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn holding(symbol: &str, byte: u8, raw: u64, decimals: u32) -> TokenHolding {
        TokenHolding {
            symbol: symbol.to_string(),
            contract: Address::repeat_byte(byte),
            raw_balance: U256::from(raw),
            decimals,
            balance: Decimal::ZERO,
            value_native: Decimal::ZERO,
        }
    }

    fn gas() -> GasParams {
        GasParams { limit: U256::from(100_000u64), price: U256::from(10_000_000_000u64) }
    }

    #[test]
    fn test_encode_transfer_call() {
        let recipient = Address::repeat_byte(0xab);
        let data = encode_transfer_call(recipient, U256::from(0x1234u64));
        assert_eq!(data.0.len(), 4 + 32 + 32);
        assert_eq!(&data.0[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        // address is left-padded to 32 bytes
        assert!(data.0[4..16].iter().all(|b| *b == 0));
        assert_eq!(&data.0[16..36], recipient.as_bytes());
        // amount is big-endian in the last word
        assert_eq!(&data.0[66..68], &[0x12, 0x34]);
    }

    #[test]
    fn test_nonces_are_sequential_in_input_order() {
        let sink = Address::repeat_byte(0x99);
        let builder = TransferBuilder::new(sink, gas(), AmountScaling::Exact);
        let dust = vec![holding("ZZZ", 3, 1, 0), holding("AAA", 1, 2, 0), holding("MMM", 2, 3, 0)];

        let transfers = builder.build_transfers(&dust, U256::from(42u64)).unwrap();
        let nonces: Vec<u64> = transfers.iter().map(|t| t.nonce.as_u64()).collect();
        assert_eq!(nonces, vec![42, 43, 44]);
        let symbols: Vec<&str> = transfers.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ZZZ", "AAA", "MMM"]);
        assert!(transfers.iter().all(|t| t.recipient == sink && t.gas == gas()));
    }

    #[test]
    fn test_empty_dust_builds_nothing() {
        let builder = TransferBuilder::new(Address::zero(), gas(), AmountScaling::Exact);
        assert!(builder.build_transfers(&[], U256::zero()).unwrap().is_empty());
    }

    #[test]
    fn test_amount_follows_scaling_policy() {
        let sink = Address::repeat_byte(0x99);
        let dust = vec![holding("USDC", 1, 1_500_000, 6)];

        let exact = TransferBuilder::new(sink, gas(), AmountScaling::Exact)
            .build_transfers(&dust, U256::zero())
            .unwrap();
        assert_eq!(exact[0].amount, U256::from(1_500_000u64));
        assert_eq!(exact[0].data, encode_transfer_call(sink, U256::from(1_500_000u64)));

        let legacy = TransferBuilder::new(sink, gas(), AmountScaling::Legacy18)
            .build_transfers(&dust, U256::zero())
            .unwrap();
        assert_eq!(legacy[0].amount, U256::from(15u64) * U256::exp10(17));
    }

    #[test]
    fn test_transaction_parameters() {
        let builder = TransferBuilder::new(Address::repeat_byte(0x99), gas(), AmountScaling::Exact);
        let transfer = builder
            .build_transfers(&[holding("T", 7, 5, 0)], U256::from(9u64))
            .unwrap()
            .remove(0);

        let params = transfer.to_transaction_parameters(1);
        assert_eq!(params.to, Some(Address::repeat_byte(7)));
        assert_eq!(params.nonce, Some(U256::from(9u64)));
        assert_eq!(params.value, U256::zero());
        assert_eq!(params.gas_price, Some(U256::from(10_000_000_000u64)));
        assert_eq!(params.chain_id, Some(1));
        assert_eq!(params.data, transfer.data);
    }
}

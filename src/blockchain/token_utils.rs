use crate::config::AmountScaling;
use crate::utils::error::{Error, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use web3::signing::keccak256;
use web3::types::{Address, U256};

/// Largest mantissa a `Decimal` can carry (2^96 - 1).
const DECIMAL_MAX_MANTISSA: u128 = (1u128 << 96) - 1;
/// Largest scale a `Decimal` can carry.
const DECIMAL_MAX_SCALE: u32 = 28;
/// Decimal count the legacy transfer amount assumes for every token.
pub const LEGACY_TRANSFER_DECIMALS: u32 = 18;

/// Token utility functions
pub struct TokenUtils;

impl TokenUtils {
    /// Convert a raw integer balance into display units (`raw / 10^decimals`).
    ///
    /// Precision past what `Decimal` can hold is truncated; balances too large to
    /// represent at all saturate to `Decimal::MAX`.
    pub fn format_token_amount(raw: U256, decimals: u32) -> Decimal {
        let mut mantissa = raw;
        let mut scale = decimals;
        while mantissa > U256::from(DECIMAL_MAX_MANTISSA) || scale > DECIMAL_MAX_SCALE {
            if scale == 0 {
                return Decimal::MAX;
            }
            mantissa /= U256::from(10u8);
            scale -= 1;
        }
        Decimal::try_from_i128_with_scale(mantissa.low_u128() as i128, scale)
            .unwrap_or(Decimal::MAX)
    }

    /// Parse a decimal integer string (the indexer's `rawBalance`) into a `U256`.
    pub fn parse_raw_amount(raw: &str) -> Result<U256> {
        U256::from_dec_str(raw.trim())
            .map_err(|e| Error::DataError(format!("Invalid raw amount {:?}: {:?}", raw, e)))
    }

    /// Convert a JSON float balance (possibly in exponent notation) to an integer amount,
    /// truncating any fractional part.
    pub fn float_to_raw_amount(value: f64) -> Result<U256> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::DataError(format!("Invalid balance value: {}", value)));
        }
        Self::parse_raw_amount(&format!("{:.0}", value.trunc()))
    }

    /// Amount in smallest units to transfer for a holding, under the chosen scaling policy.
    pub fn transfer_amount(raw: U256, decimals: u32, scaling: AmountScaling) -> Result<U256> {
        match scaling {
            | AmountScaling::Exact => Ok(raw),
            | AmountScaling::Legacy18 => {
                if decimals <= LEGACY_TRANSFER_DECIMALS {
                    let factor = U256::exp10((LEGACY_TRANSFER_DECIMALS - decimals) as usize);
                    raw.checked_mul(factor).ok_or_else(|| {
                        Error::BuildError(format!(
                            "Amount overflow re-scaling {} from {} to {} decimals",
                            raw, decimals, LEGACY_TRANSFER_DECIMALS
                        ))
                    })
                } else {
                    let shift = (decimals - LEGACY_TRANSFER_DECIMALS) as usize;
                    if shift >= 78 {
                        return Ok(U256::zero());
                    }
                    Ok(raw / U256::exp10(shift))
                }
            }
        }
    }

    /// Convert a gwei amount into wei.
    pub fn gwei_to_wei(gwei: Decimal) -> Result<U256> {
        if gwei.is_sign_negative() {
            return Err(Error::ConfigError(format!("Gas price must not be negative: {}", gwei)));
        }
        let wei = gwei
            .checked_mul(Decimal::from(1_000_000_000u64))
            .ok_or_else(|| Error::ConfigError(format!("Gas price too large: {} gwei", gwei)))?;
        let wei = wei
            .trunc()
            .to_u128()
            .ok_or_else(|| Error::ConfigError(format!("Gas price out of range: {} gwei", gwei)))?;
        Ok(U256::from(wei))
    }

    /// Parse a hex address, with or without the `0x` prefix.
    pub fn parse_address(address: &str) -> Result<Address> {
        let trimmed = address.trim();
        let stripped = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if stripped.len() != 40 {
            return Err(Error::DataError(format!("Invalid address length: {:?}", address)));
        }
        let bytes = hex::decode(stripped)
            .map_err(|e| Error::DataError(format!("Invalid address {:?}: {}", address, e)))?;
        Ok(Address::from_slice(&bytes))
    }

    /// Format an address with the EIP-55 mixed-case checksum.
    pub fn to_checksum_address(address: &Address) -> String {
        let lower = hex::encode(address.as_bytes());
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 { hash[i / 2] >> 4 } else { hash[i / 2] & 0x0f };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_token_amount() {
        // 18 decimals (like WETH)
        assert_eq!(
            TokenUtils::format_token_amount(U256::exp10(18), 18),
            dec!(1)
        );
        // 6 decimals (like USDC)
        assert_eq!(TokenUtils::format_token_amount(U256::from(1_500_000u64), 6), dec!(1.5));
        assert_eq!(TokenUtils::format_token_amount(U256::from(42u64), 0), dec!(42));
    }

    #[test]
    fn test_format_token_amount_large_values() {
        // 10^30 raw at 18 decimals does not fit a Decimal mantissa; precision is shed instead.
        let amount = TokenUtils::format_token_amount(U256::exp10(30), 18);
        assert_eq!(amount, dec!(1000000000000));

        // Beyond Decimal range entirely.
        assert_eq!(TokenUtils::format_token_amount(U256::MAX, 0), Decimal::MAX);

        // More decimals than Decimal supports.
        assert_eq!(TokenUtils::format_token_amount(U256::exp10(30), 30), dec!(1));
    }

    #[test]
    fn test_parse_raw_amounts() {
        assert_eq!(TokenUtils::parse_raw_amount("1000").unwrap(), U256::from(1000u64));
        assert!(TokenUtils::parse_raw_amount("12abc").is_err());
        assert_eq!(
            TokenUtils::float_to_raw_amount(1.5e21).unwrap(),
            U256::from(15u64) * U256::exp10(20)
        );
        assert_eq!(TokenUtils::float_to_raw_amount(12.9).unwrap(), U256::from(12u64));
        assert!(TokenUtils::float_to_raw_amount(-1.0).is_err());
        assert!(TokenUtils::float_to_raw_amount(f64::NAN).is_err());
    }

    #[test]
    fn test_transfer_amount_exact_keeps_raw_balance() {
        let raw = U256::from(1_500_000u64);
        assert_eq!(TokenUtils::transfer_amount(raw, 6, AmountScaling::Exact).unwrap(), raw);
    }

    #[test]
    fn test_transfer_amount_legacy_rescales_to_18_decimals() {
        // 1.5 USDC shown as balance 1.5, legacy path sends 1.5 * 10^18 units.
        let raw = U256::from(1_500_000u64);
        assert_eq!(
            TokenUtils::transfer_amount(raw, 6, AmountScaling::Legacy18).unwrap(),
            U256::from(15u64) * U256::exp10(17)
        );
        // 18-decimal tokens are unaffected.
        let raw = U256::from(7u64) * U256::exp10(18);
        assert_eq!(TokenUtils::transfer_amount(raw, 18, AmountScaling::Legacy18).unwrap(), raw);
        // More than 18 decimals divides.
        assert_eq!(
            TokenUtils::transfer_amount(U256::from(12_345u64), 20, AmountScaling::Legacy18)
                .unwrap(),
            U256::from(123u64)
        );
        // Overflow is reported, not wrapped.
        assert!(TokenUtils::transfer_amount(U256::MAX, 0, AmountScaling::Legacy18).is_err());
    }

    #[test]
    fn test_gwei_to_wei() {
        assert_eq!(TokenUtils::gwei_to_wei(dec!(10)).unwrap(), U256::from(10_000_000_000u64));
        assert_eq!(TokenUtils::gwei_to_wei(dec!(0.5)).unwrap(), U256::from(500_000_000u64));
        assert!(TokenUtils::gwei_to_wei(dec!(-1)).is_err());
    }

    #[test]
    fn test_parse_address() {
        let a = TokenUtils::parse_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        let b = TokenUtils::parse_address("5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED").unwrap();
        assert_eq!(a, b);
        assert!(TokenUtils::parse_address("0x1234").is_err());
        assert!(TokenUtils::parse_address("0xzzaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_err());
    }

    #[test]
    fn test_checksum_address_matches_eip55_vectors() {
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let address = TokenUtils::parse_address(expected).unwrap();
            assert_eq!(TokenUtils::to_checksum_address(&address), expected);
        }
    }
}

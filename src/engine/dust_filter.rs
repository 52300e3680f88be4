use crate::utils::types::TokenHolding;
use rust_decimal::Decimal;

/// A value is dust when it is positive and strictly below `threshold`.
/// Zero means unpriced (often spam) and is never dust.
pub fn is_dust(value: Decimal, threshold: Decimal) -> bool {
    value > Decimal::ZERO && value < threshold
}

/// Holdings whose estimated value lies in `(0, threshold)`, in input order
pub fn filter_dust(holdings: &[TokenHolding], threshold: Decimal) -> Vec<TokenHolding> {
    holdings
        .iter()
        .filter(|h| is_dust(h.value_native, threshold))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use web3::types::{Address, U256};

    fn holding(symbol: &str, value: Decimal) -> TokenHolding {
        TokenHolding {
            symbol: symbol.to_string(),
            contract: Address::zero(),
            raw_balance: U256::one(),
            decimals: 0,
            balance: Decimal::ONE,
            value_native: value,
        }
    }

    #[rstest]
    #[case(dec!(0.0), false)]
    #[case(dec!(0.009999), true)]
    #[case(dec!(0.01), false)]
    #[case(dec!(0.02), false)]
    #[case(dec!(0.000000001), true)]
    #[case(dec!(-0.001), false)]
    fn test_threshold_boundaries(#[case] value: Decimal, #[case] expected: bool) {
        assert_eq!(is_dust(value, dec!(0.01)), expected);
    }

    #[test]
    fn test_filter_partitions_and_keeps_order() {
        let holdings = vec![
            holding("A", dec!(0.005)),
            holding("ZERO", Decimal::ZERO),
            holding("B", dec!(0.5)),
            holding("C", dec!(0.001)),
            holding("EDGE", dec!(0.01)),
        ];
        let threshold = dec!(0.01);
        let dust = filter_dust(&holdings, threshold);
        let symbols: Vec<&str> = dust.iter().map(|h| h.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["A", "C"]);

        // Every holding lands in exactly one side of the partition.
        for h in &holdings {
            assert_eq!(dust.contains(h), is_dust(h.value_native, threshold));
        }
    }

    #[test]
    fn test_all_unpriced_yields_no_dust() {
        let holdings = vec![holding("X", Decimal::ZERO), holding("Y", Decimal::ZERO)];
        assert!(filter_dust(&holdings, dec!(0.01)).is_empty());
    }
}

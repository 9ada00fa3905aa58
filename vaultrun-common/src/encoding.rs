//! ABI codecs for the auxiliary payloads the supported vaults decode
//! on-chain.
//!
//! Every struct below mirrors a Solidity declaration on the receiving
//! contract; `SolValue::abi_encode` produces the same bytes as
//! `abi.encode(struct)` there, which is the correctness criterion: the
//! payload is opaque to everything between this tool and the decoder.

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolValue};

use crate::errors::EncodingError;

sol! {
    /// Single-hop swap route through a Curve V2 pool.
    struct CurveV2SingleData {
        address pool;
        int128 fromIndex;
        int128 toIndex;
    }

    /// Minimal redeem parameters: which DEX to route through, the slippage
    /// floor, and the DEX-specific exchange data.
    struct RedeemParams {
        uint8 dexId;
        uint256 minPurchaseAmount;
        bytes exchangeData;
    }

    /// Trade instructions for vaults that stake the purchased token.
    struct StakingTradeParams {
        uint8 tradeType;
        uint256 minPurchaseAmount;
        bytes exchangeData;
        uint16 dexId;
        bytes stakeData;
    }

    struct TradeParams {
        uint16 dexId;
        uint8 tradeType;
        uint256 minPurchaseAmount;
        bytes exchangeData;
    }

    /// Exit parameters for two-token pools redeemed through one side only.
    struct SingleSidedRedeemParams {
        uint256[] minAmounts;
        TradeParams[] redemptionTrades;
    }

    /// Redeem parameters for vaults that may attach an off-chain limit
    /// order quote.
    struct PendleRedeemParams {
        uint8 dexId;
        uint256 minPurchaseAmount;
        bytes exchangeData;
        bytes limitOrderData;
    }

    struct PendleOrder {
        uint256 salt;
        uint256 expiry;
        uint256 nonce;
        uint8 orderType;
        address token;
        address YT;
        address maker;
        address receiver;
        uint256 makingAmount;
        uint256 lnImpliedRate;
        uint256 failSafeRate;
        bytes permit;
    }

    struct FillOrderParams {
        PendleOrder order;
        bytes signature;
        uint256 makingAmount;
    }

    struct LimitOrderData {
        address limitRouter;
        uint256 epsSkipMarket;
        FillOrderParams[] normalFills;
        FillOrderParams[] flashFills;
        bytes optData;
    }
}

/// Number of tokens in the pools served by the single-sided exit encoding.
const SINGLE_SIDED_POOL_TOKENS: usize = 2;

pub fn encode_curve_v2_single(pool: Address, from_index: i128, to_index: i128) -> Vec<u8> {
    CurveV2SingleData { pool, fromIndex: from_index, toIndex: to_index }.abi_encode()
}

pub fn encode_redeem_params(
    dex_id: u8,
    min_purchase_amount: U256,
    exchange_data: &[u8],
) -> Vec<u8> {
    RedeemParams {
        dexId: dex_id,
        minPurchaseAmount: min_purchase_amount,
        exchangeData: exchange_data.to_vec().into(),
    }
    .abi_encode()
}

pub fn encode_staking_trade_params(
    trade_type: u8,
    min_purchase_amount: U256,
    exchange_data: &[u8],
    dex_id: u16,
    stake_data: &[u8],
) -> Vec<u8> {
    StakingTradeParams {
        tradeType: trade_type,
        minPurchaseAmount: min_purchase_amount,
        exchangeData: exchange_data.to_vec().into(),
        dexId: dex_id,
        stakeData: stake_data.to_vec().into(),
    }
    .abi_encode()
}

/// Encodes a minimum-amounts array with only the primary index populated
/// and an empty trade list.
pub fn encode_single_sided_exit(
    primary_index: usize,
    min_purchase_amount: U256,
) -> Result<Vec<u8>, EncodingError> {
    if primary_index >= SINGLE_SIDED_POOL_TOKENS {
        return Err(EncodingError::OutOfRange {
            field: "primary_index",
            value: primary_index.to_string(),
        });
    }
    let mut min_amounts = vec![U256::ZERO; SINGLE_SIDED_POOL_TOKENS];
    min_amounts[primary_index] = min_purchase_amount;
    Ok(SingleSidedRedeemParams { minAmounts: min_amounts, redemptionTrades: vec![] }.abi_encode())
}

pub fn encode_pendle_redeem_params(
    dex_id: u8,
    min_purchase_amount: U256,
    exchange_data: &[u8],
    limit_order_data: &[u8],
) -> Vec<u8> {
    PendleRedeemParams {
        dexId: dex_id,
        minPurchaseAmount: min_purchase_amount,
        exchangeData: exchange_data.to_vec().into(),
        limitOrderData: limit_order_data.to_vec().into(),
    }
    .abi_encode()
}

/// Renders bytes as `0x`-prefixed lower-case hex.
pub fn bytes_to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Parses a hex string, with or without the `0x` prefix.
pub fn hex_to_bytes(input: &str) -> Result<Vec<u8>, EncodingError> {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    Ok(hex::decode(digits)?)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use hex_literal::hex;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn word(data: &[u8], index: usize) -> U256 {
        U256::from_be_slice(&data[index * 32..(index + 1) * 32])
    }

    #[test]
    fn test_curve_v2_single_golden() {
        let encoded = encode_curve_v2_single(
            address!("DB74dfDD3BB46bE8Ce6C33dC9D82777BCFc3dEd5"),
            1,
            0,
        );
        let expected = hex!(
            "000000000000000000000000db74dfdd3bb46be8ce6c33dc9d82777bcfc3ded5"
            "0000000000000000000000000000000000000000000000000000000000000001"
            "0000000000000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_redeem_params_golden() {
        let exchange_data = encode_curve_v2_single(
            address!("DB74dfDD3BB46bE8Ce6C33dC9D82777BCFc3dEd5"),
            1,
            0,
        );
        let encoded = encode_redeem_params(7, U256::ZERO, &exchange_data);
        // Reference encoding captured from eth_abi.encode(['(uint8,uint256,bytes)'], ...).
        let expected = hex!(
            "0000000000000000000000000000000000000000000000000000000000000020"
            "0000000000000000000000000000000000000000000000000000000000000007"
            "0000000000000000000000000000000000000000000000000000000000000000"
            "0000000000000000000000000000000000000000000000000000000000000060"
            "0000000000000000000000000000000000000000000000000000000000000060"
            "000000000000000000000000db74dfdd3bb46be8ce6c33dc9d82777bcfc3ded5"
            "0000000000000000000000000000000000000000000000000000000000000001"
            "0000000000000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_redeem_params_min_purchase_one_ether() {
        let exchange_data = encode_curve_v2_single(
            address!("DB74dfDD3BB46bE8Ce6C33dC9D82777BCFc3dEd5"),
            1,
            0,
        );
        let encoded = encode_redeem_params(
            7,
            U256::from(1_000_000_000_000_000_000u64),
            &exchange_data,
        );
        assert_eq!(word(&encoded, 0), U256::from(0x20));
        assert_eq!(word(&encoded, 1), U256::from(7));
        assert_eq!(word(&encoded, 2), U256::from(1_000_000_000_000_000_000u64));
    }

    #[test]
    fn test_redeem_params_with_empty_exchange_data() {
        let encoded = encode_redeem_params(0, U256::from(42), &[]);
        let expected = hex!(
            "0000000000000000000000000000000000000000000000000000000000000020"
            "0000000000000000000000000000000000000000000000000000000000000000"
            "000000000000000000000000000000000000000000000000000000000000002a"
            "0000000000000000000000000000000000000000000000000000000000000060"
            "0000000000000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(encoded, expected);
    }

    #[rstest]
    #[case::zero(U256::ZERO)]
    #[case::one_ether(U256::from(1_000_000_000_000_000_000u64))]
    #[case::max(U256::MAX)]
    fn test_single_sided_exit_layout(#[case] min_purchase: U256) {
        let encoded = encode_single_sided_exit(1, min_purchase).unwrap();
        assert_eq!(encoded.len(), 7 * 32);
        assert_eq!(word(&encoded, 0), U256::from(0x20));
        // Head: offsets of the two dynamic members.
        assert_eq!(word(&encoded, 1), U256::from(0x40));
        assert_eq!(word(&encoded, 2), U256::from(0xa0));
        // minAmounts = [0, M]
        assert_eq!(word(&encoded, 3), U256::from(2));
        assert_eq!(word(&encoded, 4), U256::ZERO);
        assert_eq!(word(&encoded, 5), min_purchase);
        // redemptionTrades is always empty.
        assert_eq!(word(&encoded, 6), U256::ZERO);
    }

    #[test]
    fn test_single_sided_exit_rejects_bad_index() {
        let err = encode_single_sided_exit(2, U256::ZERO).unwrap_err();
        assert!(matches!(err, EncodingError::OutOfRange { field: "primary_index", .. }));
    }

    #[test]
    fn test_staking_trade_params_golden() {
        let exchange_data = encode_curve_v2_single(
            address!("02950460E2b9529D0E00284A5fA2d7bDF3fA4d72"),
            1,
            0,
        );
        let encoded = encode_staking_trade_params(1, U256::ZERO, &exchange_data, 7, &[]);
        let expected = hex!(
            "0000000000000000000000000000000000000000000000000000000000000020"
            "0000000000000000000000000000000000000000000000000000000000000001"
            "0000000000000000000000000000000000000000000000000000000000000000"
            "00000000000000000000000000000000000000000000000000000000000000a0"
            "0000000000000000000000000000000000000000000000000000000000000007"
            "0000000000000000000000000000000000000000000000000000000000000120"
            "0000000000000000000000000000000000000000000000000000000000000060"
            "00000000000000000000000002950460e2b9529d0e00284a5fa2d7bdf3fa4d72"
            "0000000000000000000000000000000000000000000000000000000000000001"
            "0000000000000000000000000000000000000000000000000000000000000000"
            "0000000000000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_pendle_redeem_params_with_empty_order() {
        let exchange_data = encode_curve_v2_single(
            address!("bEbc44782C7dB0a1A60Cb6fe97d0b483032FF1C7"),
            0,
            1,
        );
        let encoded =
            encode_pendle_redeem_params(7, U256::from(1000), &exchange_data, &[]);
        assert_eq!(encoded.len(), 10 * 32);
        assert_eq!(word(&encoded, 0), U256::from(0x20));
        assert_eq!(word(&encoded, 1), U256::from(7));
        assert_eq!(word(&encoded, 2), U256::from(1000));
        // exchangeData at 0x80, limitOrderData right behind it.
        assert_eq!(word(&encoded, 3), U256::from(0x80));
        assert_eq!(word(&encoded, 4), U256::from(0x100));
        assert_eq!(word(&encoded, 5), U256::from(0x60));
        // Trailing word is the empty limit order length.
        assert_eq!(word(&encoded, 9), U256::ZERO);
    }

    #[rstest]
    #[case::empty(&[])]
    #[case::single(&[0xffu8])]
    #[case::word(&hex!("000000000000000000000000db74dfdd3bb46be8ce6c33dc9d82777bcfc3ded5"))]
    fn test_hex_round_trip(#[case] data: &[u8]) {
        let rendered = bytes_to_hex(data);
        assert!(rendered.starts_with("0x"));
        assert_eq!(rendered, rendered.to_lowercase());
        assert_eq!(hex_to_bytes(&rendered).unwrap(), data);
    }

    #[test]
    fn test_hex_to_bytes_accepts_unprefixed() {
        assert_eq!(hex_to_bytes("deadbeef").unwrap(), hex!("deadbeef"));
        assert_eq!(hex_to_bytes("0xdeadbeef").unwrap(), hex!("deadbeef"));
    }

    #[rstest]
    #[case::odd_length("0xabc")]
    #[case::non_hex("0xzz")]
    fn test_hex_to_bytes_rejects_malformed(#[case] input: &str) {
        assert!(matches!(hex_to_bytes(input), Err(EncodingError::MalformedHex(_))));
    }
}

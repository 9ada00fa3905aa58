//! Read-only Ethereum access for the action orchestrator.
//!
//! Calls are plain `eth_call` JSON-RPC requests addressed by 4-byte
//! selectors; no ABI files are involved since every queried function
//! either returns a single word or takes a single word.

pub mod errors;

use alloy_primitives::{keccak256, Address, U256};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;
use vaultrun_common::{
    encoding::{bytes_to_hex, hex_to_bytes},
    format_address, PrecisionTriple,
};

pub use crate::errors::RpcError;

/// Where a vault's yield-token decimals come from: some vaults expose a
/// `yieldToken()` accessor, others pin a constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum YieldTokenSource {
    Constant(u32),
    Accessor,
}

#[derive(Clone, Debug)]
pub struct EthereumRpc {
    http: Client,
    url: Url,
}

impl EthereumRpc {
    pub fn new(rpc_url: &str) -> Result<Self, RpcError> {
        let url = Url::parse(rpc_url)
            .map_err(|e| RpcError::UrlParsing(format!("{rpc_url}: {e}")))?;
        Ok(Self { http: Client::new(), url })
    }

    /// Leading 4 bytes of the keccak-256 hash of the canonical signature.
    pub fn selector(signature: &str) -> [u8; 4] {
        let hash = keccak256(signature.as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Issues an `eth_call` against the latest block and returns the raw
    /// result bytes.
    pub async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                { "to": format_address(&to), "data": bytes_to_hex(&data) },
                "latest"
            ]
        });
        debug!(to = %format_address(&to), data = %bytes_to_hex(&data), "eth_call");

        let response = self
            .http
            .post(self.url.clone())
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(RpcError::Http(response.status()));
        }
        let body: Value = response.json().await?;
        if let Some(error) = body.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(RpcError::CallReverted(message));
        }
        let result = body
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::ParseResponse("missing result field".to_string()))?;
        hex_to_bytes(result).map_err(|e| RpcError::ParseResponse(e.to_string()))
    }

    /// Calls a no-argument function identified by its signature string.
    pub async fn call_function(&self, to: Address, signature: &str) -> Result<Vec<u8>, RpcError> {
        self.call(to, Self::selector(signature).to_vec())
            .await
    }

    /// Fetches the (asset, yield token, share) decimals for a vault.
    ///
    /// Three to five read calls: `asset()` on the vault, `decimals()` on
    /// the asset, `decimals()` on the vault itself, and, when the vault
    /// exposes it, `yieldToken()` plus its `decimals()`.
    pub async fn get_precision_triple(
        &self,
        vault: Address,
        yield_token: YieldTokenSource,
    ) -> Result<PrecisionTriple, RpcError> {
        let asset = decode_address_word(&self.call_function(vault, "asset()").await?)?;
        let asset_decimals =
            decode_decimals_word(&self.call_function(asset, "decimals()").await?)?;
        let share_decimals =
            decode_decimals_word(&self.call_function(vault, "decimals()").await?)?;
        let yield_token_decimals = match yield_token {
            YieldTokenSource::Constant(decimals) => decimals,
            YieldTokenSource::Accessor => {
                let token =
                    decode_address_word(&self.call_function(vault, "yieldToken()").await?)?;
                decode_decimals_word(&self.call_function(token, "decimals()").await?)?
            }
        };
        Ok(PrecisionTriple {
            asset: asset_decimals,
            yield_token: yield_token_decimals,
            shares: share_decimals,
        })
    }

    /// Converts a 1e24-precision share amount into the vault's yield-token
    /// amount via `convertSharesToYieldToken(uint256)`.
    pub async fn convert_shares_to_yield_token(
        &self,
        vault: Address,
        shares: U256,
    ) -> Result<U256, RpcError> {
        let mut data = Self::selector("convertSharesToYieldToken(uint256)").to_vec();
        data.extend_from_slice(&shares.to_be_bytes::<32>());
        decode_uint_word(&self.call(vault, data).await?)
    }
}

fn decode_uint_word(result: &[u8]) -> Result<U256, RpcError> {
    if result.len() != 32 {
        return Err(RpcError::ParseResponse(format!(
            "expected a 32-byte word, got {} bytes",
            result.len()
        )));
    }
    Ok(U256::from_be_slice(result))
}

fn decode_address_word(result: &[u8]) -> Result<Address, RpcError> {
    if result.len() != 32 {
        return Err(RpcError::ParseResponse(format!(
            "expected a 32-byte address word, got {} bytes",
            result.len()
        )));
    }
    Ok(Address::from_slice(&result[12..]))
}

fn decode_decimals_word(result: &[u8]) -> Result<u32, RpcError> {
    let value = decode_uint_word(result)?;
    u32::try_from(value)
        .map_err(|_| RpcError::ParseResponse(format!("decimals value out of range: {value}")))
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use vaultrun_common::parse_address;

    use super::*;

    const VAULT: &str = "0x2716561755154eef59bc48eb13712510b27f167f";
    const ASSET: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

    fn word_hex(value: u64) -> String {
        format!("0x{value:064x}")
    }

    fn address_word(address: &str) -> String {
        format!("0x000000000000000000000000{}", address.trim_start_matches("0x"))
    }

    #[test]
    fn test_selector_matches_known_values() {
        assert_eq!(EthereumRpc::selector("decimals()"), [0x31, 0x3c, 0xe5, 0x67]);
        assert_eq!(EthereumRpc::selector("asset()"), [0x38, 0xd5, 0x2e, 0x0f]);
    }

    #[tokio::test]
    async fn test_get_precision_triple_with_constant_yield_decimals() {
        let mut server = Server::new_async().await;
        let asset_mock = server
            .mock("POST", "/")
            .match_body(Matcher::Regex("38d52e0f".to_string()))
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": address_word(ASSET)}).to_string())
            .create_async()
            .await;
        let asset_decimals_mock = server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("313ce567".to_string()),
                Matcher::Regex(ASSET.trim_start_matches("0x").to_string()),
            ]))
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": word_hex(6)}).to_string())
            .create_async()
            .await;
        let share_decimals_mock = server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("313ce567".to_string()),
                Matcher::Regex(VAULT.trim_start_matches("0x").to_string()),
            ]))
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": word_hex(18)}).to_string())
            .create_async()
            .await;

        let rpc = EthereumRpc::new(&server.url()).unwrap();
        let triple = rpc
            .get_precision_triple(parse_address(VAULT).unwrap(), YieldTokenSource::Constant(18))
            .await
            .unwrap();

        assert_eq!(triple, PrecisionTriple { asset: 6, yield_token: 18, shares: 18 });
        asset_mock.assert_async().await;
        asset_decimals_mock.assert_async().await;
        share_decimals_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_call_surfaces_revert() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "error": {"code": 3, "message": "execution reverted"}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let rpc = EthereumRpc::new(&server.url()).unwrap();
        let err = rpc
            .call_function(parse_address(VAULT).unwrap(), "asset()")
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::CallReverted(message) if message == "execution reverted"));
    }

    #[tokio::test]
    async fn test_call_surfaces_http_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(500)
            .create_async()
            .await;

        let rpc = EthereumRpc::new(&server.url()).unwrap();
        let err = rpc
            .call_function(parse_address(VAULT).unwrap(), "asset()")
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Http(status) if status.as_u16() == 500));
    }

    #[tokio::test]
    async fn test_convert_shares_to_yield_token() {
        let mut server = Server::new_async().await;
        let shares = U256::from(5u64) * U256::from(10u64).pow(U256::from(24));
        let mock = server
            .mock("POST", "/")
            // Selector plus the BE-encoded shares argument.
            .match_body(Matcher::Regex(format!("{shares:064x}")))
            .with_body(
                json!({"jsonrpc": "2.0", "id": 1, "result": word_hex(4_200_000)}).to_string(),
            )
            .create_async()
            .await;

        let rpc = EthereumRpc::new(&server.url()).unwrap();
        let amount = rpc
            .convert_shares_to_yield_token(parse_address(VAULT).unwrap(), shares)
            .await
            .unwrap();
        assert_eq!(amount, U256::from(4_200_000u64));
        mock.assert_async().await;
    }

    #[test]
    fn test_rejects_malformed_url() {
        assert!(matches!(EthereumRpc::new("not a url"), Err(RpcError::UrlParsing(_))));
    }
}

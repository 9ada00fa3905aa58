//! Client for the Pendle limit-order quote API.
//!
//! The quote is strictly optional: the target contract accepts empty order
//! bytes and falls back to a plain market exit, so every failure here
//! (transport, bad status, missing route, malformed fields) degrades to
//! empty bytes instead of failing the action. This is the one deliberate
//! exception to the hard-failure rule for remote calls.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolValue;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use vaultrun_common::{
    encoding::{hex_to_bytes, FillOrderParams, LimitOrderData, PendleOrder},
    format_address, parse_address, EncodingError,
};

pub const PENDLE_API_URL: &str = "https://api-v2.pendle.finance/core/v2/sdk";

const MAINNET_NETWORK_ID: u64 = 1;

/// Index of the limit-order struct within the route's contract call
/// parameter list.
const LIMIT_ORDER_PARAM_INDEX: usize = 4;

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("quote request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("quote API returned status {0}")]
    Status(StatusCode),

    #[error("quote response contained no route")]
    NoRoute,

    #[error("malformed quote response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    routes: Vec<QuoteRoute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRoute {
    contract_param_info: ContractParamInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractParamInfo {
    contract_call_params: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LimitOrderParams {
    limit_router: String,
    eps_skip_market: String,
    normal_fills: Vec<FillOrder>,
    flash_fills: Vec<FillOrder>,
    opt_data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FillOrder {
    order: OrderFields,
    signature: String,
    making_amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderFields {
    salt: String,
    expiry: String,
    nonce: String,
    order_type: u64,
    token: String,
    #[serde(rename = "YT")]
    yt: String,
    maker: String,
    receiver: String,
    making_amount: String,
    ln_implied_rate: String,
    fail_safe_rate: String,
    permit: String,
}

pub struct PendleQuoteClient {
    http: reqwest::Client,
    base_url: String,
    network_id: u64,
}

impl Default for PendleQuoteClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PendleQuoteClient {
    pub fn new() -> Self {
        Self::with_base_url(PENDLE_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into(), network_id: MAINNET_NETWORK_ID }
    }

    /// Fetches a limit-order quote and ABI-encodes it. Returns empty bytes
    /// when the route has no fills or when anything at all goes wrong.
    pub async fn fetch_limit_order_data(
        &self,
        receiver: Address,
        slippage: f64,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Vec<u8> {
        match self
            .try_fetch(receiver, slippage, token_in, token_out, amount_in)
            .await
        {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "limit order quote unavailable, using empty order data");
                Vec::new()
            }
        }
    }

    async fn try_fetch(
        &self,
        receiver: Address,
        slippage: f64,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<Vec<u8>, QuoteError> {
        let url = format!(
            "{base}/{network}/convert?receiver={receiver}&slippage={slippage}\
             &enableAggregator=false&tokensIn={token_in}&tokensOut={token_out}\
             &amountsIn={amount_in}",
            base = self.base_url,
            network = self.network_id,
            receiver = format_address(&receiver),
            token_in = format_address(&token_in),
            token_out = format_address(&token_out),
        );
        debug!(%url, "fetching limit order quote");

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(QuoteError::Status(response.status()));
        }
        let body: QuoteResponse = response.json().await?;

        let route = body.routes.into_iter().next().ok_or(QuoteError::NoRoute)?;
        let params_value = route
            .contract_param_info
            .contract_call_params
            .into_iter()
            .nth(LIMIT_ORDER_PARAM_INDEX)
            .ok_or_else(|| QuoteError::Malformed("missing limit order call param".to_string()))?;
        let params: LimitOrderParams = serde_json::from_value(params_value)
            .map_err(|e| QuoteError::Malformed(e.to_string()))?;

        if params.normal_fills.is_empty() && params.flash_fills.is_empty() {
            debug!("quote contained no fills");
            return Ok(Vec::new());
        }
        Ok(params.into_sol()?.abi_encode())
    }
}

impl LimitOrderParams {
    fn into_sol(self) -> Result<LimitOrderData, EncodingError> {
        Ok(LimitOrderData {
            limitRouter: parse_field_address(&self.limit_router, "limitRouter")?,
            epsSkipMarket: parse_field_u256(&self.eps_skip_market, "epsSkipMarket")?,
            normalFills: self
                .normal_fills
                .iter()
                .map(FillOrder::to_sol)
                .collect::<Result<Vec<_>, _>>()?,
            flashFills: self
                .flash_fills
                .iter()
                .map(FillOrder::to_sol)
                .collect::<Result<Vec<_>, _>>()?,
            optData: hex_to_bytes(&self.opt_data)?.into(),
        })
    }
}

impl FillOrder {
    fn to_sol(&self) -> Result<FillOrderParams, EncodingError> {
        Ok(FillOrderParams {
            order: PendleOrder {
                salt: parse_field_u256(&self.order.salt, "salt")?,
                expiry: parse_field_u256(&self.order.expiry, "expiry")?,
                nonce: parse_field_u256(&self.order.nonce, "nonce")?,
                orderType: u8::try_from(self.order.order_type).map_err(|_| {
                    EncodingError::OutOfRange {
                        field: "orderType",
                        value: self.order.order_type.to_string(),
                    }
                })?,
                token: parse_field_address(&self.order.token, "token")?,
                YT: parse_field_address(&self.order.yt, "YT")?,
                maker: parse_field_address(&self.order.maker, "maker")?,
                receiver: parse_field_address(&self.order.receiver, "receiver")?,
                makingAmount: parse_field_u256(&self.order.making_amount, "makingAmount")?,
                lnImpliedRate: parse_field_u256(&self.order.ln_implied_rate, "lnImpliedRate")?,
                failSafeRate: parse_field_u256(&self.order.fail_safe_rate, "failSafeRate")?,
                permit: hex_to_bytes(&self.order.permit)?.into(),
            },
            signature: hex_to_bytes(&self.signature)?.into(),
            makingAmount: parse_field_u256(&self.making_amount, "makingAmount")?,
        })
    }
}

fn parse_field_u256(value: &str, field: &'static str) -> Result<U256, EncodingError> {
    let trimmed = value.trim();
    let parsed = match trimmed.strip_prefix("0x") {
        Some(digits) => U256::from_str_radix(digits, 16),
        None => U256::from_str_radix(trimmed, 10),
    };
    parsed.map_err(|_| EncodingError::OutOfRange { field, value: value.to_string() })
}

fn parse_field_address(value: &str, field: &'static str) -> Result<Address, EncodingError> {
    parse_address(value)
        .map_err(|_| EncodingError::InvalidValue { field, value: value.to_string() })
}

//! Vault holding a Pendle principal token, redeemed via an optional
//! off-chain limit order.

use std::sync::Arc;

use alloy_primitives::{address, Address, U256};
use async_trait::async_trait;
use tracing::info;
use vaultrun_common::{
    encoding::{encode_curve_v2_single, encode_pendle_redeem_params},
    PrecisionTriple,
};
use vaultrun_ethereum::{EthereumRpc, YieldTokenSource};

use super::{VaultAdapter, VaultContext, VaultError, DEX_ID_CURVE_V2};
use crate::quote::PendleQuoteClient;

pub(crate) const ADDRESS: Address = address!("0e61e810f0918081cbfd2ac8c97e5866daf3f622");

const PT_TOKEN: Address = address!("e6a934089bbee34f832060ce98848359883749b3");
const TOKEN_OUT_SY: Address = address!("9d39a5de30e57443bff2a8307a4256c8797a3497");
/// Curve 3pool used to swap the exit proceeds (USDC/USDT/DAI).
const TRIPOOL: Address = address!("bebc44782c7db0a1a60cb6fe97d0b483032ff1c7");
const SLIPPAGE: f64 = 0.001;
const LTV: f64 = 0.915;

pub(crate) fn create(address: Address, rpc: Arc<EthereumRpc>) -> Box<dyn VaultAdapter> {
    Box::new(PendlePtVault {
        ctx: VaultContext::new(address, rpc, YieldTokenSource::Accessor),
        quote: PendleQuoteClient::new(),
    })
}

struct PendlePtVault {
    ctx: VaultContext,
    quote: PendleQuoteClient,
}

#[async_trait]
impl VaultAdapter for PendlePtVault {
    fn address(&self) -> Address {
        self.ctx.address()
    }

    fn loan_to_value(&self) -> f64 {
        LTV
    }

    async fn precision_triple(&self) -> Result<PrecisionTriple, VaultError> {
        self.ctx.precision_triple().await
    }

    async fn deposit_payload(&self, _min_purchase_amount: U256) -> Result<Vec<u8>, VaultError> {
        Ok(Vec::new())
    }

    /// Without a share amount there is nothing to quote, so the payload is
    /// empty. With one, the shares are converted to a yield-token amount
    /// on-chain and a limit order is requested for it; a missing quote
    /// leaves the order bytes empty rather than failing the exit.
    async fn redeem_payload(
        &self,
        min_purchase_amount: U256,
        shares_to_redeem: Option<U256>,
    ) -> Result<Vec<u8>, VaultError> {
        let Some(shares) = shares_to_redeem else {
            return Ok(Vec::new());
        };
        let exchange_data = encode_curve_v2_single(TRIPOOL, 0, 1);
        let yield_token_amount = self
            .ctx
            .rpc()
            .convert_shares_to_yield_token(self.ctx.address(), shares)
            .await?;
        info!(%shares, %yield_token_amount, "converted shares to yield token amount");

        let limit_order_data = self
            .quote
            .fetch_limit_order_data(
                self.ctx.address(),
                SLIPPAGE,
                PT_TOKEN,
                TOKEN_OUT_SY,
                yield_token_amount,
            )
            .await;
        Ok(encode_pendle_redeem_params(
            DEX_ID_CURVE_V2,
            min_purchase_amount,
            &exchange_data,
            &limit_order_data,
        ))
    }

    async fn withdraw_payload(&self) -> Result<Vec<u8>, VaultError> {
        Ok(Vec::new())
    }
}

//! Vault that swaps USDC to USDe on entry and stakes the proceeds.

use std::sync::Arc;

use alloy_primitives::{address, Address, U256};
use async_trait::async_trait;
use vaultrun_common::{
    encoding::{encode_curve_v2_single, encode_staking_trade_params},
    format_address, PrecisionTriple,
};
use vaultrun_ethereum::{EthereumRpc, YieldTokenSource};

use super::{VaultAdapter, VaultContext, VaultError, DEX_ID_CURVE_V2};

pub(crate) const ADDRESS: Address = address!("af14d06a65c91541a5b2db627ecd1c92d7d9c48b");

const USDC_USDE_POOL: Address = address!("02950460e2b9529d0e00284a5fa2d7bdf3fa4d72");
const TRADE_TYPE: u8 = 1;
const LTV: f64 = 0.915;

pub(crate) fn create(address: Address, rpc: Arc<EthereumRpc>) -> Box<dyn VaultAdapter> {
    Box::new(StakedUsdeVault {
        ctx: VaultContext::new(address, rpc, YieldTokenSource::Constant(18)),
    })
}

struct StakedUsdeVault {
    ctx: VaultContext,
}

#[async_trait]
impl VaultAdapter for StakedUsdeVault {
    fn address(&self) -> Address {
        self.ctx.address()
    }

    fn loan_to_value(&self) -> f64 {
        LTV
    }

    async fn precision_triple(&self) -> Result<PrecisionTriple, VaultError> {
        self.ctx.precision_triple().await
    }

    async fn deposit_payload(&self, min_purchase_amount: U256) -> Result<Vec<u8>, VaultError> {
        let exchange_data = encode_curve_v2_single(USDC_USDE_POOL, 1, 0);
        Ok(encode_staking_trade_params(
            TRADE_TYPE,
            min_purchase_amount,
            &exchange_data,
            DEX_ID_CURVE_V2 as u16,
            &[],
        ))
    }

    // The target contract's redeem decoding for this vault is not pinned
    // down yet; refusing is safer than guessing a payload shape.
    async fn redeem_payload(
        &self,
        _min_purchase_amount: U256,
        _shares_to_redeem: Option<U256>,
    ) -> Result<Vec<u8>, VaultError> {
        Err(VaultError::UnsupportedAction {
            address: format_address(&self.ctx.address()),
            action: "redeem",
        })
    }

    async fn withdraw_payload(&self) -> Result<Vec<u8>, VaultError> {
        Ok(Vec::new())
    }
}

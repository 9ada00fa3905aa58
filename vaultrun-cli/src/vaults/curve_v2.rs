//! Vault redeemed through a single Curve V2 swap.

use std::sync::Arc;

use alloy_primitives::{address, Address, U256};
use async_trait::async_trait;
use vaultrun_common::{
    encoding::{encode_curve_v2_single, encode_redeem_params},
    PrecisionTriple,
};
use vaultrun_ethereum::{EthereumRpc, YieldTokenSource};

use super::{VaultAdapter, VaultContext, VaultError, DEX_ID_CURVE_V2};

pub(crate) const ADDRESS: Address = address!("7f723fee1e65a7d26be51a05af0b5efee4a7d5ae");

const CURVE_V2_POOL: Address = address!("db74dfdd3bb46be8ce6c33dc9d82777bcfc3ded5");
const FROM_INDEX: i128 = 1;
const TO_INDEX: i128 = 0;
const LTV: f64 = 0.945;

pub(crate) fn create(address: Address, rpc: Arc<EthereumRpc>) -> Box<dyn VaultAdapter> {
    Box::new(CurveV2Vault { ctx: VaultContext::new(address, rpc, YieldTokenSource::Constant(18)) })
}

struct CurveV2Vault {
    ctx: VaultContext,
}

#[async_trait]
impl VaultAdapter for CurveV2Vault {
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

    async fn redeem_payload(
        &self,
        min_purchase_amount: U256,
        _shares_to_redeem: Option<U256>,
    ) -> Result<Vec<u8>, VaultError> {
        let exchange_data = encode_curve_v2_single(CURVE_V2_POOL, FROM_INDEX, TO_INDEX);
        Ok(encode_redeem_params(DEX_ID_CURVE_V2, min_purchase_amount, &exchange_data))
    }

    async fn withdraw_payload(&self) -> Result<Vec<u8>, VaultError> {
        Ok(Vec::new())
    }
}

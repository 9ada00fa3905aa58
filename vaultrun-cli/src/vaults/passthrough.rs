//! Vaults whose decoders take no auxiliary data on deposit or withdraw and
//! only a slippage floor on redeem.

use std::sync::Arc;

use alloy_primitives::{address, Address, U256};
use async_trait::async_trait;
use vaultrun_common::{encoding::encode_redeem_params, PrecisionTriple};
use vaultrun_ethereum::{EthereumRpc, YieldTokenSource};

use super::{VaultAdapter, VaultContext, VaultError, DEX_ID_NONE};

pub(crate) const ADDRESSES: [Address; 2] = [
    address!("2a5c94fe8fa6c0c8d2a87e5c71ad628caa092ce4"),
    address!("94f6cb4fae0eb3fa74e9847dff2ff52fd5ec7e6e"),
];

const LTV: f64 = 0.86;

pub(crate) fn create(address: Address, rpc: Arc<EthereumRpc>) -> Box<dyn VaultAdapter> {
    Box::new(PassthroughVault {
        ctx: VaultContext::new(address, rpc, YieldTokenSource::Constant(18)),
    })
}

struct PassthroughVault {
    ctx: VaultContext,
}

#[async_trait]
impl VaultAdapter for PassthroughVault {
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
        Ok(encode_redeem_params(DEX_ID_NONE, min_purchase_amount, &[]))
    }

    async fn withdraw_payload(&self) -> Result<Vec<u8>, VaultError> {
        Ok(Vec::new())
    }
}

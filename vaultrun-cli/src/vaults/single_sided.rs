//! Two-token pool vault redeemed entirely through its primary token.

use std::sync::Arc;

use alloy_primitives::{address, Address, U256};
use async_trait::async_trait;
use vaultrun_common::{encoding::encode_single_sided_exit, PrecisionTriple};
use vaultrun_ethereum::{EthereumRpc, YieldTokenSource};

use super::{VaultAdapter, VaultContext, VaultError};

pub(crate) const ADDRESS: Address = address!("2716561755154eef59bc48eb13712510b27f167f");

/// Index of the pool token the exit is quoted in.
const PRIMARY_INDEX: usize = 1;
const LTV: f64 = 0.915;

pub(crate) fn create(address: Address, rpc: Arc<EthereumRpc>) -> Box<dyn VaultAdapter> {
    Box::new(SingleSidedVault {
        ctx: VaultContext::new(address, rpc, YieldTokenSource::Constant(18)),
    })
}

struct SingleSidedVault {
    ctx: VaultContext,
}

#[async_trait]
impl VaultAdapter for SingleSidedVault {
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
        Ok(encode_single_sided_exit(PRIMARY_INDEX, min_purchase_amount)?)
    }

    async fn withdraw_payload(&self) -> Result<Vec<u8>, VaultError> {
        Ok(Vec::new())
    }
}

//! Per-vault payload strategies.
//!
//! Every supported vault address maps to exactly one adapter. The adapter
//! owns the vault's routing constants and decides which payload fields are
//! populated; the registry below is the static equivalent of the usual
//! "one module per vault" discovery: assembled once at process start,
//! never mutated behind the caller's back.

pub mod curve_v2;
pub mod passthrough;
pub mod pendle_pt;
pub mod single_sided;
pub mod staked_usde;

use std::{collections::HashMap, sync::Arc};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::warn;
use vaultrun_common::{format_address, EncodingError, PrecisionTriple};
use vaultrun_ethereum::{EthereumRpc, RpcError, YieldTokenSource};

/// DexId values understood by the trading module.
pub const DEX_ID_NONE: u8 = 0;
pub const DEX_ID_CURVE_V2: u8 = 7;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("vault {address} has no {action} payload defined")]
    UnsupportedAction { address: String, action: &'static str },
}

/// Payload construction and decimals lookup for one vault.
#[async_trait]
pub trait VaultAdapter: Send + Sync {
    fn address(&self) -> Address;

    /// Loan-to-value of the vault's lending market. Display only, never
    /// part of any calldata.
    fn loan_to_value(&self) -> f64;

    async fn precision_triple(&self) -> Result<PrecisionTriple, VaultError>;

    async fn deposit_payload(&self, min_purchase_amount: U256) -> Result<Vec<u8>, VaultError>;

    async fn redeem_payload(
        &self,
        min_purchase_amount: U256,
        shares_to_redeem: Option<U256>,
    ) -> Result<Vec<u8>, VaultError>;

    async fn withdraw_payload(&self) -> Result<Vec<u8>, VaultError>;
}

/// State shared by all adapter implementations: the vault identity, the
/// chain reader, and the lazily fetched decimals (cached for the adapter
/// instance's lifetime only).
pub(crate) struct VaultContext {
    address: Address,
    rpc: Arc<EthereumRpc>,
    yield_token: YieldTokenSource,
    decimals: OnceCell<PrecisionTriple>,
}

impl VaultContext {
    pub(crate) fn new(address: Address, rpc: Arc<EthereumRpc>, yield_token: YieldTokenSource) -> Self {
        Self { address, rpc, yield_token, decimals: OnceCell::new() }
    }

    pub(crate) fn address(&self) -> Address {
        self.address
    }

    pub(crate) fn rpc(&self) -> &EthereumRpc {
        &self.rpc
    }

    pub(crate) async fn precision_triple(&self) -> Result<PrecisionTriple, VaultError> {
        let triple = self
            .decimals
            .get_or_try_init(|| self.rpc.get_precision_triple(self.address, self.yield_token))
            .await?;
        Ok(*triple)
    }
}

pub type AdapterCtor = fn(Address, Arc<EthereumRpc>) -> Box<dyn VaultAdapter>;

/// Resolves vault addresses to their adapter implementations.
pub struct VaultRegistry {
    adapters: HashMap<Address, AdapterCtor>,
}

impl VaultRegistry {
    /// Builds the registry from the static set of known vault identities.
    pub fn with_known_vaults() -> Self {
        let mut registry = Self { adapters: HashMap::new() };
        for address in passthrough::ADDRESSES {
            registry.discover(address, passthrough::create);
        }
        registry.discover(curve_v2::ADDRESS, curve_v2::create);
        registry.discover(single_sided::ADDRESS, single_sided::create);
        registry.discover(staked_usde::ADDRESS, staked_usde::create);
        registry.discover(pendle_pt::ADDRESS, pendle_pt::create);
        registry
    }

    /// Discovery-time insertion: a duplicate address is a configuration
    /// mistake and must not silently replace the earlier entry.
    fn discover(&mut self, address: Address, ctor: AdapterCtor) {
        if self.adapters.contains_key(&address) {
            warn!(address = %format_address(&address), "duplicate vault registration skipped");
            return;
        }
        self.adapters.insert(address, ctor);
    }

    /// Explicit registration; replaces and returns any existing constructor.
    pub fn register(&mut self, address: Address, ctor: AdapterCtor) -> Option<AdapterCtor> {
        self.adapters.insert(address, ctor)
    }

    /// Instantiates the adapter for an address, or `None` for an
    /// unsupported vault.
    pub fn resolve(&self, address: Address, rpc: Arc<EthereumRpc>) -> Option<Box<dyn VaultAdapter>> {
        self.adapters
            .get(&address)
            .map(|ctor| ctor(address, rpc))
    }

    pub fn known_addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<_> = self.adapters.keys().copied().collect();
        addresses.sort();
        addresses
    }
}

//! Composition of validated inputs, adapter payloads and forge invocations.
//!
//! Each action follows the same shape: validate raw input, resolve the
//! adapter, fetch decimals, scale amounts, compute the payload, then hand
//! everything to the execution tool. Validation failures abort before any
//! network or subprocess call; nothing on-chain is ever mutated from here.

use std::sync::Arc;

use alloy_primitives::Address;
use thiserror::Error;
use tracing::info;
use vaultrun_common::{
    encoding::bytes_to_hex,
    format_address, parse_address,
    scaling::{scale_shares, scale_to_integer, validate_amount},
    ValidationError,
};
use vaultrun_ethereum::{EthereumRpc, RpcError};

use crate::{
    forge::{ExecutionOptions, ForgeError, ForgeRunner},
    vaults::{VaultAdapter, VaultError, VaultRegistry},
};

const CREATE_POSITION_SCRIPT: &str = "script/actions/CreateInitialPosition.sol";
const EXIT_POSITION_SCRIPT: &str = "script/actions/ExitPosition.sol";
const EXIT_AND_WITHDRAW_SCRIPT: &str = "script/actions/ExitPositionAndWithdraw.sol";
const DEPOSIT_TO_MORPHO_SCRIPT: &str = "script/actions/DepositToMorpho.sol";
const WITHDRAW_FROM_MORPHO_SCRIPT: &str = "script/actions/WithdrawFromMorpho.sol";
const INITIATE_WITHDRAW_SCRIPT: &str = "script/actions/InitiateWithdraw.sol";
const FORCE_WITHDRAW_SCRIPT: &str = "script/actions/ForceWithdraw.sol";
const FINALIZE_WITHDRAW_SCRIPT: &str = "script/actions/FinalizeWithdraw.sol";
const LIQUIDATE_SCRIPT: &str = "script/actions/Liquidate.sol";
const LIQUIDATE_ACCOUNT_SCRIPT: &str = "script/actions/LiquidateAccount.sol";
const VIEW_MARKET_SCRIPT: &str = "script/views/ViewMarketDetails.sol";
const VIEW_ACCOUNT_SCRIPT: &str = "script/views/ViewAccountDetails.sol";

#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no vault implementation registered for {address}; known vaults:\n{known}")]
    UnsupportedVault { address: String, known: String },

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Forge(#[from] ForgeError),
}

pub struct ActionRunner {
    rpc: Arc<EthereumRpc>,
    registry: VaultRegistry,
    forge: ForgeRunner,
}

impl ActionRunner {
    pub fn new(rpc_url: &str, etherscan_token: Option<String>) -> Result<Self, ActionError> {
        Ok(Self {
            rpc: Arc::new(EthereumRpc::new(rpc_url)?),
            registry: VaultRegistry::with_known_vaults(),
            forge: ForgeRunner::new(rpc_url.to_string(), etherscan_token),
        })
    }

    fn adapter(&self, vault: Address) -> Result<Box<dyn VaultAdapter>, ActionError> {
        self.registry
            .resolve(vault, self.rpc.clone())
            .ok_or_else(|| ActionError::UnsupportedVault {
                address: format_address(&vault),
                known: self
                    .registry
                    .known_addresses()
                    .iter()
                    .map(|a| format!("  {}", format_address(a)))
                    .collect::<Vec<_>>()
                    .join("\n"),
            })
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_position(
        &self,
        vault_address: &str,
        initial_deposit: &str,
        initial_supply: &str,
        initial_borrow: &str,
        min_purchase_amount: &str,
        options: &ExecutionOptions,
    ) -> Result<(), ActionError> {
        let vault = parse_address(vault_address)?;
        for amount in [initial_deposit, initial_supply, initial_borrow, min_purchase_amount] {
            validate_amount(amount)?;
        }
        let adapter = self.adapter(vault)?;
        info!(vault = %format_address(&vault), "using vault implementation");

        let decimals = adapter.precision_triple().await?;
        let deposit = scale_to_integer(initial_deposit, decimals.asset)?;
        let supply = scale_to_integer(initial_supply, decimals.asset)?;
        let borrow = scale_to_integer(initial_borrow, decimals.asset)?;
        let min_purchase = scale_to_integer(min_purchase_amount, decimals.asset)?;
        info!(%deposit, %supply, %borrow, %min_purchase, "scaled amounts");

        let payload = adapter.deposit_payload(min_purchase).await?;
        let data = bytes_to_hex(&payload);
        println!("Deposit data: {data}");

        let stdout = self
            .forge
            .run(
                CREATE_POSITION_SCRIPT,
                "run(address,uint256,uint256,uint256,bytes)",
                options,
                &[
                    format_address(&vault),
                    supply.to_string(),
                    borrow.to_string(),
                    deposit.to_string(),
                    data,
                ],
            )
            .await?;
        println!("{stdout}");
        Ok(())
    }

    pub async fn exit_position(
        &self,
        vault_address: &str,
        shares_to_redeem: &str,
        asset_to_repay: &str,
        min_purchase_amount: &str,
        options: &ExecutionOptions,
    ) -> Result<(), ActionError> {
        let vault = parse_address(vault_address)?;
        for amount in [shares_to_redeem, asset_to_repay, min_purchase_amount] {
            validate_amount(amount)?;
        }
        let adapter = self.adapter(vault)?;

        // Shares live in fixed 1e24 precision, the repayment in the
        // asset's native precision.
        let shares = scale_shares(shares_to_redeem)?;
        let decimals = adapter.precision_triple().await?;
        let repay = scale_to_integer(asset_to_repay, decimals.asset)?;
        let min_purchase = scale_to_integer(min_purchase_amount, decimals.asset)?;
        info!(%shares, %repay, %min_purchase, "scaled amounts");

        let payload = adapter.redeem_payload(min_purchase, Some(shares)).await?;
        let data = bytes_to_hex(&payload);
        println!("Redeem data: {data}");

        let stdout = self
            .forge
            .run(
                EXIT_POSITION_SCRIPT,
                "run(address,uint256,uint256,bytes)",
                options,
                &[format_address(&vault), shares.to_string(), repay.to_string(), data],
            )
            .await?;
        println!("{stdout}");
        Ok(())
    }

    pub async fn exit_position_and_withdraw(
        &self,
        vault_address: &str,
        min_purchase_amount: &str,
        options: &ExecutionOptions,
    ) -> Result<(), ActionError> {
        let vault = parse_address(vault_address)?;
        validate_amount(min_purchase_amount)?;
        let adapter = self.adapter(vault)?;

        let decimals = adapter.precision_triple().await?;
        let min_purchase = scale_to_integer(min_purchase_amount, decimals.asset)?;
        let payload = adapter.redeem_payload(min_purchase, None).await?;
        let data = bytes_to_hex(&payload);
        println!("Redeem data: {data}");

        let stdout = self
            .forge
            .run(
                EXIT_AND_WITHDRAW_SCRIPT,
                "run(address,bytes)",
                options,
                &[format_address(&vault), data],
            )
            .await?;
        println!("{stdout}");
        Ok(())
    }

    pub async fn deposit_to_morpho(
        &self,
        vault_address: &str,
        amount: &str,
        options: &ExecutionOptions,
    ) -> Result<(), ActionError> {
        let vault = parse_address(vault_address)?;
        validate_amount(amount)?;
        let adapter = self.adapter(vault)?;

        let decimals = adapter.precision_triple().await?;
        let scaled = scale_to_integer(amount, decimals.asset)?;
        info!(amount = %scaled, "depositing to morpho");

        let stdout = self
            .forge
            .run(
                DEPOSIT_TO_MORPHO_SCRIPT,
                "run(address,uint256)",
                options,
                &[format_address(&vault), scaled.to_string()],
            )
            .await?;
        println!("{stdout}");
        Ok(())
    }

    pub async fn withdraw_from_morpho(
        &self,
        vault_address: &str,
        options: &ExecutionOptions,
    ) -> Result<(), ActionError> {
        let vault = parse_address(vault_address)?;
        let stdout = self
            .forge
            .run(
                WITHDRAW_FROM_MORPHO_SCRIPT,
                "run(address)",
                options,
                &[format_address(&vault)],
            )
            .await?;
        println!("{stdout}");
        Ok(())
    }

    pub async fn initiate_withdraw(
        &self,
        vault_address: &str,
        options: &ExecutionOptions,
    ) -> Result<(), ActionError> {
        let vault = parse_address(vault_address)?;
        let adapter = self.adapter(vault)?;

        let payload = adapter.withdraw_payload().await?;
        let data = bytes_to_hex(&payload);
        println!("Withdraw data: {data}");

        let stdout = self
            .forge
            .run(
                INITIATE_WITHDRAW_SCRIPT,
                "run(address,bytes)",
                options,
                &[format_address(&vault), data],
            )
            .await?;
        println!("{stdout}");
        Ok(())
    }

    pub async fn force_withdraw(
        &self,
        vault_address: &str,
        account_address: &str,
        options: &ExecutionOptions,
    ) -> Result<(), ActionError> {
        let vault = parse_address(vault_address)?;
        let account = parse_address(account_address)?;
        let stdout = self
            .forge
            .run(
                FORCE_WITHDRAW_SCRIPT,
                "run(address,address)",
                options,
                &[format_address(&vault), format_address(&account)],
            )
            .await?;
        println!("{stdout}");
        Ok(())
    }

    pub async fn finalize_withdraw(
        &self,
        vault_address: &str,
        account_address: &str,
        options: &ExecutionOptions,
    ) -> Result<(), ActionError> {
        let vault = parse_address(vault_address)?;
        let account = parse_address(account_address)?;
        let stdout = self
            .forge
            .run(
                FINALIZE_WITHDRAW_SCRIPT,
                "run(address,address)",
                options,
                &[format_address(&vault), format_address(&account)],
            )
            .await?;
        println!("{stdout}");
        Ok(())
    }

    pub async fn liquidate(
        &self,
        vault_address: &str,
        account_address: &str,
        shares_to_liquidate: &str,
        options: &ExecutionOptions,
    ) -> Result<(), ActionError> {
        let vault = parse_address(vault_address)?;
        let account = parse_address(account_address)?;
        validate_amount(shares_to_liquidate)?;
        let shares = scale_shares(shares_to_liquidate)?;
        info!(%shares, "liquidating shares");

        let stdout = self
            .forge
            .run(
                LIQUIDATE_SCRIPT,
                "run(address,address,uint256)",
                options,
                &[format_address(&vault), format_address(&account), shares.to_string()],
            )
            .await?;
        println!("{stdout}");
        Ok(())
    }

    pub async fn liquidate_account(
        &self,
        vault_address: &str,
        account_address: &str,
        options: &ExecutionOptions,
    ) -> Result<(), ActionError> {
        let vault = parse_address(vault_address)?;
        let account = parse_address(account_address)?;
        let stdout = self
            .forge
            .run(
                LIQUIDATE_ACCOUNT_SCRIPT,
                "run(address,address)",
                options,
                &[format_address(&vault), format_address(&account)],
            )
            .await?;
        println!("{stdout}");
        Ok(())
    }

    pub async fn view_market_details(
        &self,
        vault_address: &str,
        options: &ExecutionOptions,
    ) -> Result<(), ActionError> {
        let vault = parse_address(vault_address)?;
        let adapter = self.adapter(vault)?;

        let decimals = adapter.precision_triple().await?;
        println!("Vault:                {}", format_address(&vault));
        println!("Loan-to-value:        {}", adapter.loan_to_value());
        println!("Asset decimals:       {}", decimals.asset);
        println!("Yield token decimals: {}", decimals.yield_token);
        println!("Share decimals:       {}", decimals.shares);

        let stdout = self
            .forge
            .run(VIEW_MARKET_SCRIPT, "run(address)", options, &[format_address(&vault)])
            .await?;
        println!("{stdout}");
        Ok(())
    }

    pub async fn view_account_details(
        &self,
        vault_address: &str,
        account_address: &str,
        options: &ExecutionOptions,
    ) -> Result<(), ActionError> {
        let vault = parse_address(vault_address)?;
        let account = parse_address(account_address)?;
        let stdout = self
            .forge
            .run(
                VIEW_ACCOUNT_SCRIPT,
                "run(address,address)",
                options,
                &[format_address(&vault), format_address(&account)],
            )
            .await?;
        println!("{stdout}");
        Ok(())
    }

    pub async fn get_decimals(&self, vault_address: &str) -> Result<(), ActionError> {
        let vault = parse_address(vault_address)?;
        let adapter = self.adapter(vault)?;
        let decimals = adapter.precision_triple().await?;
        println!("Asset decimals:       {}", decimals.asset);
        println!("Yield token decimals: {}", decimals.yield_token);
        println!("Share decimals:       {}", decimals.shares);
        Ok(())
    }

    pub fn list_vaults(&self) {
        let addresses = self.registry.known_addresses();
        if addresses.is_empty() {
            println!("No vault implementations found");
            return;
        }
        println!("Supported vault addresses:");
        for address in addresses {
            println!("  {}", format_address(&address));
        }
    }
}

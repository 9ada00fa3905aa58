//! Command line surface: one subcommand per vault action.
//!
//! The `mode` positional (`sim` or `exec`) and the mode-conditional
//! credentials are validated by us rather than clap so that every
//! validation failure exits with code 1 through the same error path.

use clap::{Args, Parser, Subcommand};
use tracing::info;
use vaultrun_common::ValidationError;

use crate::{
    actions::ActionRunner,
    forge::{ExecutionMode, ExecutionOptions},
};

/// Prepares calldata for leveraged vault actions and executes them through
/// forge scripts, either against a fork (sim) or for real (exec).
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "vaultrun", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global_args: GlobalArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct GlobalArgs {
    /// Ethereum JSON-RPC endpoint, used for metadata lookups and passed to
    /// forge.
    #[clap(long, env = "RPC_URL", hide_env_values = true, global = true)]
    pub rpc_url: Option<String>,

    /// Enable verbose logging.
    #[clap(long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// `--rpc-url` / `RPC_URL` wins; `MAINNET_RPC_URL` is the fallback.
    pub fn resolve_rpc_url(&self) -> Result<String, ValidationError> {
        if let Some(url) = &self.rpc_url {
            return Ok(url.clone());
        }
        std::env::var("MAINNET_RPC_URL").map_err(|_| ValidationError::MissingRpcUrl)
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ExecutionArgs {
    /// Sender address (required for sim mode).
    #[clap(long)]
    pub sender: Option<String>,

    /// Account name (required for exec mode).
    #[clap(long)]
    pub account: Option<String>,

    /// Gas estimate multiplier in percent (>100, e.g. 150 for a 50% increase).
    #[clap(long)]
    pub gas_estimate_multiplier: Option<u32>,
}

impl ExecutionArgs {
    fn to_options(&self, mode: &str) -> Result<ExecutionOptions, ValidationError> {
        ExecutionOptions::new(
            mode,
            self.sender.clone(),
            self.account.clone(),
            self.gas_estimate_multiplier,
        )
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct VaultActionArgs {
    /// Execution mode: sim or exec.
    pub mode: String,
    /// Vault contract address.
    pub vault_address: String,
    #[clap(flatten)]
    pub execution: ExecutionArgs,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct AccountActionArgs {
    /// Execution mode: sim or exec.
    pub mode: String,
    /// Vault contract address.
    pub vault_address: String,
    /// Target account address.
    pub account_address: String,
    #[clap(flatten)]
    pub execution: ExecutionArgs,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct CreatePositionArgs {
    /// Execution mode: sim or exec.
    pub mode: String,
    /// Vault contract address.
    pub vault_address: String,
    /// Initial deposit amount.
    pub initial_deposit: String,
    /// Initial supply amount.
    pub initial_supply: String,
    /// Initial borrow amount.
    pub initial_borrow: String,
    /// Minimum purchase amount for slippage protection.
    pub min_purchase_amount: String,
    #[clap(flatten)]
    pub execution: ExecutionArgs,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ExitPositionArgs {
    /// Execution mode: sim or exec.
    pub mode: String,
    /// Vault contract address.
    pub vault_address: String,
    /// Shares to redeem (1e24 precision).
    pub shares_to_redeem: String,
    /// Asset amount to repay (native precision).
    pub asset_to_repay: String,
    /// Minimum purchase amount for slippage protection.
    pub min_purchase_amount: String,
    #[clap(flatten)]
    pub execution: ExecutionArgs,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ExitAndWithdrawArgs {
    /// Execution mode: sim or exec.
    pub mode: String,
    /// Vault contract address.
    pub vault_address: String,
    /// Minimum purchase amount for slippage protection.
    pub min_purchase_amount: String,
    #[clap(flatten)]
    pub execution: ExecutionArgs,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct DepositToMorphoArgs {
    /// Execution mode: sim or exec.
    pub mode: String,
    /// Vault contract address.
    pub vault_address: String,
    /// Asset amount to deposit (native precision).
    pub amount: String,
    #[clap(flatten)]
    pub execution: ExecutionArgs,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct LiquidateArgs {
    /// Execution mode: sim or exec.
    pub mode: String,
    /// Vault contract address.
    pub vault_address: String,
    /// Account to liquidate.
    pub account_address: String,
    /// Shares to liquidate (1e24 precision).
    pub shares_to_liquidate: String,
    #[clap(flatten)]
    pub execution: ExecutionArgs,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct GetDecimalsArgs {
    /// Vault contract address.
    pub vault_address: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create the initial leveraged position for a vault.
    CreatePosition(CreatePositionArgs),
    /// Exit part of a position with explicit share and repayment amounts.
    ExitPosition(ExitPositionArgs),
    /// Exit the full position and withdraw the proceeds.
    ExitPositionAndWithdraw(ExitAndWithdrawArgs),
    /// Deposit idle assets into the Morpho market.
    DepositToMorpho(DepositToMorphoArgs),
    /// Withdraw assets from the Morpho market.
    WithdrawFromMorpho(VaultActionArgs),
    /// Initiate a withdraw request for vault assets.
    InitiateWithdraw(VaultActionArgs),
    /// Force a withdraw request for another account.
    ForceWithdraw(AccountActionArgs),
    /// Finalize a pending withdraw request for an account.
    FinalizeWithdraw(AccountActionArgs),
    /// Liquidate part of an account's position.
    Liquidate(LiquidateArgs),
    /// Liquidate an account's entire position.
    LiquidateAccount(AccountActionArgs),
    /// Print market parameters for a vault.
    ViewMarketDetails(VaultActionArgs),
    /// Print position details for an account.
    ViewAccountDetails(AccountActionArgs),
    /// Print the decimal precision triple for a vault.
    GetDecimals(GetDecimalsArgs),
    /// List supported vault addresses.
    ListVaults,
}

pub async fn run_cli() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let log_level = if cli.global_args.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("failed to set up logging subscriber: {e}"))?;

    let rpc_url = cli.global_args.resolve_rpc_url()?;
    let etherscan_token = std::env::var("ETHERSCAN_TOKEN").ok();
    let runner = ActionRunner::new(&rpc_url, etherscan_token)?;

    run_command(&runner, cli.command).await?;
    Ok(())
}

async fn run_command(runner: &ActionRunner, command: Command) -> Result<(), anyhow::Error> {
    match command {
        Command::CreatePosition(args) => {
            let options = args.execution.to_options(&args.mode)?;
            runner
                .create_position(
                    &args.vault_address,
                    &args.initial_deposit,
                    &args.initial_supply,
                    &args.initial_borrow,
                    &args.min_purchase_amount,
                    &options,
                )
                .await?;
            report_success(&options);
        }
        Command::ExitPosition(args) => {
            let options = args.execution.to_options(&args.mode)?;
            runner
                .exit_position(
                    &args.vault_address,
                    &args.shares_to_redeem,
                    &args.asset_to_repay,
                    &args.min_purchase_amount,
                    &options,
                )
                .await?;
            report_success(&options);
        }
        Command::ExitPositionAndWithdraw(args) => {
            let options = args.execution.to_options(&args.mode)?;
            runner
                .exit_position_and_withdraw(
                    &args.vault_address,
                    &args.min_purchase_amount,
                    &options,
                )
                .await?;
            report_success(&options);
        }
        Command::DepositToMorpho(args) => {
            let options = args.execution.to_options(&args.mode)?;
            runner
                .deposit_to_morpho(&args.vault_address, &args.amount, &options)
                .await?;
            report_success(&options);
        }
        Command::WithdrawFromMorpho(args) => {
            let options = args.execution.to_options(&args.mode)?;
            runner
                .withdraw_from_morpho(&args.vault_address, &options)
                .await?;
            report_success(&options);
        }
        Command::InitiateWithdraw(args) => {
            let options = args.execution.to_options(&args.mode)?;
            runner
                .initiate_withdraw(&args.vault_address, &options)
                .await?;
            report_success(&options);
        }
        Command::ForceWithdraw(args) => {
            let options = args.execution.to_options(&args.mode)?;
            runner
                .force_withdraw(&args.vault_address, &args.account_address, &options)
                .await?;
            report_success(&options);
        }
        Command::FinalizeWithdraw(args) => {
            let options = args.execution.to_options(&args.mode)?;
            runner
                .finalize_withdraw(&args.vault_address, &args.account_address, &options)
                .await?;
            report_success(&options);
        }
        Command::Liquidate(args) => {
            let options = args.execution.to_options(&args.mode)?;
            runner
                .liquidate(
                    &args.vault_address,
                    &args.account_address,
                    &args.shares_to_liquidate,
                    &options,
                )
                .await?;
            report_success(&options);
        }
        Command::LiquidateAccount(args) => {
            let options = args.execution.to_options(&args.mode)?;
            runner
                .liquidate_account(&args.vault_address, &args.account_address, &options)
                .await?;
            report_success(&options);
        }
        Command::ViewMarketDetails(args) => {
            let options = args.execution.to_options(&args.mode)?;
            runner
                .view_market_details(&args.vault_address, &options)
                .await?;
        }
        Command::ViewAccountDetails(args) => {
            let options = args.execution.to_options(&args.mode)?;
            runner
                .view_account_details(&args.vault_address, &args.account_address, &options)
                .await?;
        }
        Command::GetDecimals(args) => {
            runner.get_decimals(&args.vault_address).await?;
        }
        Command::ListVaults => {
            runner.list_vaults();
        }
    }
    Ok(())
}

fn report_success(options: &ExecutionOptions) {
    match options.mode {
        ExecutionMode::Sim => info!("simulation completed successfully"),
        ExecutionMode::Exec => info!("action executed successfully"),
    }
}

#[cfg(test)]
mod cli_tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_create_position_parsing() {
        let cli = Cli::try_parse_from([
            "vaultrun",
            "--rpc-url",
            "http://localhost:8545",
            "create-position",
            "sim",
            "0x7f723fee1e65a7d26be51a05af0b5efee4a7d5ae",
            "1000",
            "1000",
            "3000",
            "3990",
            "--sender",
            "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
        ])
        .expect("parse errored");

        assert_eq!(cli.global_args.rpc_url, Some("http://localhost:8545".to_string()));
        match cli.command {
            Command::CreatePosition(args) => {
                assert_eq!(args.mode, "sim");
                assert_eq!(args.vault_address, "0x7f723fee1e65a7d26be51a05af0b5efee4a7d5ae");
                assert_eq!(args.initial_deposit, "1000");
                assert_eq!(args.initial_supply, "1000");
                assert_eq!(args.initial_borrow, "3000");
                assert_eq!(args.min_purchase_amount, "3990");
                assert_eq!(
                    args.execution.sender,
                    Some("0x70997970c51812dc3a010c7d01b50e0d17dc79c8".to_string())
                );
                assert_eq!(args.execution.account, None);
                assert_eq!(args.execution.gas_estimate_multiplier, None);
            }
            other => panic!("expected create-position, got {other:?}"),
        }
    }

    #[test]
    fn test_exec_mode_flags_parsing() {
        let cli = Cli::try_parse_from([
            "vaultrun",
            "exit-position-and-withdraw",
            "exec",
            "0x7f723fee1e65a7d26be51a05af0b5efee4a7d5ae",
            "0.95",
            "--account",
            "deployer",
            "--gas-estimate-multiplier",
            "150",
        ])
        .expect("parse errored");

        match cli.command {
            Command::ExitPositionAndWithdraw(args) => {
                assert_eq!(args.mode, "exec");
                assert_eq!(args.min_purchase_amount, "0.95");
                assert_eq!(args.execution.account, Some("deployer".to_string()));
                assert_eq!(args.execution.gas_estimate_multiplier, Some(150));
            }
            other => panic!("expected exit-position-and-withdraw, got {other:?}"),
        }
    }

    #[test]
    fn test_list_vaults_needs_no_arguments() {
        let cli = Cli::try_parse_from(["vaultrun", "list-vaults"]).expect("parse errored");
        assert_eq!(cli.command, Command::ListVaults);
    }

    #[test]
    fn test_missing_positional_is_a_parse_error() {
        assert!(Cli::try_parse_from(["vaultrun", "exit-position", "sim"]).is_err());
    }

    #[rstest]
    #[case::invalid_mode("fork", None, None)]
    #[case::sim_without_sender("sim", None, None)]
    #[case::exec_without_account("exec", Some("0x70997970c51812dc3a010c7d01b50e0d17dc79c8"), None)]
    fn test_mode_credential_validation(
        #[case] mode: &str,
        #[case] sender: Option<&str>,
        #[case] account: Option<&str>,
    ) {
        let args = ExecutionArgs {
            sender: sender.map(String::from),
            account: account.map(String::from),
            gas_estimate_multiplier: None,
        };
        assert!(args.to_options(mode).is_err());
    }

    #[test]
    fn test_mode_validation_accepts_both_modes() {
        let sim = ExecutionArgs {
            sender: Some("0x70997970c51812dc3a010c7d01b50e0d17dc79c8".to_string()),
            account: None,
            gas_estimate_multiplier: None,
        };
        assert!(sim.to_options("sim").is_ok());

        let exec = ExecutionArgs {
            sender: None,
            account: Some("deployer".to_string()),
            gas_estimate_multiplier: Some(150),
        };
        assert!(exec.to_options("exec").is_ok());
    }
}

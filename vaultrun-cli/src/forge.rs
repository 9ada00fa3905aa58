//! Invocation of the external `forge script` execution tool.
//!
//! The tool is treated as an opaque subprocess with a documented contract:
//! positional arguments matching the action script's `run(...)` signature,
//! mode-dependent flags, exit code 0 on success. Nothing is submitted
//! on-chain by this process itself.

use std::str::FromStr;

use strum_macros::{Display, EnumString};
use thiserror::Error;
use tokio::process::Command;
use tracing::info;
use vaultrun_common::{parse_address, ValidationError};

/// Dry-run against a forked state vs. real submission to the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ExecutionMode {
    Sim,
    Exec,
}

/// Validated mode plus mode-conditional credentials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionOptions {
    pub mode: ExecutionMode,
    pub sender: Option<String>,
    pub account: Option<String>,
    pub gas_estimate_multiplier: Option<u32>,
}

impl ExecutionOptions {
    pub fn new(
        mode: &str,
        sender: Option<String>,
        account: Option<String>,
        gas_estimate_multiplier: Option<u32>,
    ) -> Result<Self, ValidationError> {
        let mode = ExecutionMode::from_str(mode)
            .map_err(|_| ValidationError::InvalidMode(mode.to_string()))?;
        match mode {
            ExecutionMode::Sim if sender.is_none() => return Err(ValidationError::MissingSender),
            ExecutionMode::Exec
                if account
                    .as_deref()
                    .map_or(true, |name| name.trim().is_empty()) =>
            {
                return Err(ValidationError::MissingAccount)
            }
            _ => {}
        }
        if let Some(sender) = &sender {
            parse_address(sender)?;
        }
        if let Some(multiplier) = gas_estimate_multiplier {
            if multiplier <= 100 {
                return Err(ValidationError::InvalidGasMultiplier(multiplier));
            }
        }
        Ok(Self { mode, sender, account, gas_estimate_multiplier })
    }
}

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("failed to spawn forge: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("forge exited with status {status}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}")]
    Failed { status: i32, stdout: String, stderr: String },
}

/// Builds and runs `forge script` invocations.
pub struct ForgeRunner {
    program: String,
    rpc_url: String,
    etherscan_token: Option<String>,
}

impl ForgeRunner {
    pub fn new(rpc_url: String, etherscan_token: Option<String>) -> Self {
        Self { program: "forge".to_string(), rpc_url, etherscan_token }
    }

    #[cfg(test)]
    fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    /// Assembles the full argument vector for one script invocation.
    pub fn command_args(
        &self,
        script: &str,
        signature: &str,
        options: &ExecutionOptions,
        call_args: &[String],
    ) -> Vec<String> {
        let mut args = vec![
            "script".to_string(),
            script.to_string(),
            "--sig".to_string(),
            signature.to_string(),
        ];
        match options.mode {
            ExecutionMode::Sim => {
                args.push("--fork-url".to_string());
                args.push(self.rpc_url.clone());
                if let Some(sender) = &options.sender {
                    args.push("--sender".to_string());
                    args.push(sender.clone());
                }
            }
            ExecutionMode::Exec => {
                args.push("--rpc-url".to_string());
                args.push(self.rpc_url.clone());
                args.push("--broadcast".to_string());
                if let Some(account) = &options.account {
                    args.push("--account".to_string());
                    args.push(account.clone());
                }
                if let Some(sender) = &options.sender {
                    args.push("--sender".to_string());
                    args.push(sender.clone());
                }
            }
        }
        if let Some(multiplier) = options.gas_estimate_multiplier {
            args.push("--gas-estimate-multiplier".to_string());
            args.push(multiplier.to_string());
        }
        args.extend(call_args.iter().cloned());
        args
    }

    /// Runs the script and returns its stdout. A non-zero exit carries both
    /// captured streams back to the caller verbatim.
    pub async fn run(
        &self,
        script: &str,
        signature: &str,
        options: &ExecutionOptions,
        call_args: &[String],
    ) -> Result<String, ForgeError> {
        let args = self.command_args(script, signature, options, call_args);
        info!(command = %format!("{} {}", self.program, args.join(" ")), "executing forge");

        let mut command = Command::new(&self.program);
        command.args(&args).env("RPC_URL", &self.rpc_url);
        if let Some(token) = &self.etherscan_token {
            command.env("ETHERSCAN_TOKEN", token);
        }
        let output = command.output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if output.status.success() {
            Ok(stdout)
        } else {
            Err(ForgeError::Failed { status: output.status.code().unwrap_or(-1), stdout, stderr })
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const SENDER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    fn sim_options() -> ExecutionOptions {
        ExecutionOptions::new("sim", Some(SENDER.to_string()), None, None).unwrap()
    }

    #[test]
    fn test_sim_command_args() {
        let runner = ForgeRunner::new("http://localhost:8545".to_string(), None);
        let args = runner.command_args(
            "script/actions/ExitPositionAndWithdraw.sol",
            "run(address,bytes)",
            &sim_options(),
            &["0x2716561755154eef59bc48eb13712510b27f167f".to_string(), "0x".to_string()],
        );
        assert_eq!(
            args,
            vec![
                "script",
                "script/actions/ExitPositionAndWithdraw.sol",
                "--sig",
                "run(address,bytes)",
                "--fork-url",
                "http://localhost:8545",
                "--sender",
                SENDER,
                "0x2716561755154eef59bc48eb13712510b27f167f",
                "0x",
            ]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_exec_command_args_with_gas_multiplier() {
        let runner = ForgeRunner::new("http://localhost:8545".to_string(), None);
        let options =
            ExecutionOptions::new("exec", None, Some("deployer".to_string()), Some(150)).unwrap();
        let args = runner.command_args(
            "script/actions/WithdrawFromMorpho.sol",
            "run(address)",
            &options,
            &["0x2716561755154eef59bc48eb13712510b27f167f".to_string()],
        );
        assert_eq!(
            args,
            vec![
                "script",
                "script/actions/WithdrawFromMorpho.sol",
                "--sig",
                "run(address)",
                "--rpc-url",
                "http://localhost:8545",
                "--broadcast",
                "--account",
                "deployer",
                "--gas-estimate-multiplier",
                "150",
                "0x2716561755154eef59bc48eb13712510b27f167f",
            ]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
        );
    }

    #[rstest]
    #[case::unknown_mode("broadcast", None, None, ValidationError::InvalidMode("broadcast".to_string()))]
    #[case::sim_needs_sender("sim", None, None, ValidationError::MissingSender)]
    #[case::exec_needs_account("exec", None, None, ValidationError::MissingAccount)]
    #[case::blank_account("exec", None, Some("  "), ValidationError::MissingAccount)]
    fn test_option_validation(
        #[case] mode: &str,
        #[case] sender: Option<&str>,
        #[case] account: Option<&str>,
        #[case] expected: ValidationError,
    ) {
        let err = ExecutionOptions::new(
            mode,
            sender.map(String::from),
            account.map(String::from),
            None,
        )
        .unwrap_err();
        assert_eq!(err, expected);
    }

    #[test]
    fn test_rejects_low_gas_multiplier() {
        let err = ExecutionOptions::new("sim", Some(SENDER.to_string()), None, Some(100))
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidGasMultiplier(100));
    }

    #[test]
    fn test_rejects_non_address_sender() {
        let err = ExecutionOptions::new("sim", Some("alice".to_string()), None, None).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn test_run_captures_failure_status() {
        let runner = ForgeRunner::new("http://localhost:8545".to_string(), None)
            .with_program("false");
        let err = runner
            .run("script/actions/WithdrawFromMorpho.sol", "run(address)", &sim_options(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::Failed { status: 1, .. }));
    }

    #[tokio::test]
    async fn test_run_returns_stdout_on_success() {
        let runner =
            ForgeRunner::new("http://localhost:8545".to_string(), None).with_program("echo");
        let stdout = runner
            .run("script/actions/WithdrawFromMorpho.sol", "run(address)", &sim_options(), &[])
            .await
            .unwrap();
        assert!(stdout.contains("--fork-url"));
    }
}

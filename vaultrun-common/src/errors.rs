use thiserror::Error;

/// Rejections of raw user input, raised before any network or subprocess
/// call is made.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid vault address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("amount cannot be negative: {0}")]
    NegativeAmount(String),

    #[error("amount does not fit into uint256: {0}")]
    AmountTooLarge(String),

    #[error("mode must be one of [sim, exec], got: {0}")]
    InvalidMode(String),

    #[error("--sender is required for sim mode")]
    MissingSender,

    #[error("--account is required for exec mode")]
    MissingAccount,

    #[error("--gas-estimate-multiplier must be greater than 100, got: {0}")]
    InvalidGasMultiplier(u32),

    #[error("RPC_URL must be provided via --rpc-url or the environment")]
    MissingRpcUrl,
}

/// Failures while converting values into their ABI byte representation.
#[derive(Error, Debug, PartialEq)]
pub enum EncodingError {
    #[error("malformed hex string: {0}")]
    MalformedHex(#[from] hex::FromHexError),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },

    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

use reqwest::StatusCode;
use thiserror::Error;

/// Failures of on-chain read calls.
///
/// These are always hard failures: a decimals value that silently fell back
/// to a default would corrupt every scaled amount derived from it.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("failed to parse RPC URL: {0}")]
    UrlParsing(String),

    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC endpoint returned status {0}")]
    Http(StatusCode),

    #[error("eth_call failed: {0}")]
    CallReverted(String),

    #[error("failed to parse RPC response: {0}")]
    ParseResponse(String),
}

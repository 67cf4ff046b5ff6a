//! Error types

use solana_client::client_error::ClientError;
use thiserror::Error;

/// JSON-RPC error code the node returns when preflight simulation fails.
pub const PREFLIGHT_FAILURE_CODE: i64 = -32002;

#[derive(Error, Debug)]
pub enum SvmRpcError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to call {method}: {source}")]
    Transport {
        method: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to call {method}: {source}")]
    SolanaClient {
        method: String,
        #[source]
        source: Box<ClientError>,
    },

    #[error("SVM RPC error from {method} ({code}): {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("Invalid {method} response: {reason}")]
    InvalidResponse { method: String, reason: String },
}

impl SvmRpcError {
    /// True when the node rejected a transaction during preflight simulation,
    /// i.e. the program (or the token program) refused the instructions.
    pub fn is_preflight_failure(&self) -> bool {
        matches!(self, SvmRpcError::Rpc { code, .. } if *code == PREFLIGHT_FAILURE_CODE)
    }
}

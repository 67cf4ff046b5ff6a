//! Solana SVM RPC Client Module
//!
//! Account reads talk plain JSON-RPC over `reqwest`. Account data is always
//! requested in base64 encoding and decoded here, so callers only ever see raw
//! bytes. Blockhash retrieval, transaction submission and signature status
//! polling go through `solana-client`'s nonblocking `RpcClient`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_config::RpcSendTransactionConfig,
    rpc_request::RpcError,
};
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, TransactionError},
};
use solana_transaction_status_client_types::{
    TransactionConfirmationStatus, TransactionStatus, UiTransactionEncoding,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::SvmRpcError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// ACCOUNT STRUCTURES
// ============================================================================

/// Raw on-chain account as returned by `getAccountInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountData {
    pub lamports: u64,
    pub owner: Pubkey,
    pub executable: bool,
    pub data: Vec<u8>,
}

/// Confirmation depth of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationStatus {
    Processed,
    Confirmed,
    Finalized,
}

impl ConfirmationStatus {
    /// Resolves the depth of a status entry.
    ///
    /// Older nodes omit `confirmationStatus`. For those, a missing
    /// confirmation count means the slot is rooted, a positive count means
    /// confirmed, and zero means processed.
    pub fn resolve(
        reported: Option<&TransactionConfirmationStatus>,
        confirmations: Option<usize>,
    ) -> Self {
        match (reported, confirmations) {
            (Some(TransactionConfirmationStatus::Processed), _) => ConfirmationStatus::Processed,
            (Some(TransactionConfirmationStatus::Confirmed), _) => ConfirmationStatus::Confirmed,
            (Some(TransactionConfirmationStatus::Finalized), _) => ConfirmationStatus::Finalized,
            (None, None) => ConfirmationStatus::Finalized,
            (None, Some(n)) if n > 0 => ConfirmationStatus::Confirmed,
            (None, Some(_)) => ConfirmationStatus::Processed,
        }
    }

    /// Whether this status is at least as deep as the requested commitment.
    pub fn satisfies(&self, commitment: CommitmentLevel) -> bool {
        let required = match commitment {
            CommitmentLevel::Processed => ConfirmationStatus::Processed,
            CommitmentLevel::Confirmed => ConfirmationStatus::Confirmed,
            CommitmentLevel::Finalized => ConfirmationStatus::Finalized,
        };
        *self >= required
    }
}

/// Status of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureStatus {
    pub slot: u64,
    pub confirmations: Option<usize>,
    /// Execution error, if the transaction landed but failed.
    pub err: Option<TransactionError>,
    pub confirmation_status: ConfirmationStatus,
}

impl From<TransactionStatus> for SignatureStatus {
    fn from(status: TransactionStatus) -> Self {
        let confirmation_status =
            ConfirmationStatus::resolve(status.confirmation_status.as_ref(), status.confirmations);
        Self {
            slot: status.slot,
            confirmations: status.confirmations,
            err: status.err,
            confirmation_status,
        }
    }
}

// ============================================================================
// JSON-RPC TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    method: &'a str,
    params: serde_json::Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RpcContextValue<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct RpcAccount {
    data: (String, String),
    executable: bool,
    lamports: u64,
    owner: String,
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct SvmRpcClient {
    client: Client,
    rpc_client: RpcClient,
    rpc_url: String,
    commitment: CommitmentLevel,
}

impl SvmRpcClient {
    /// Creates a client for the given endpoint. Every read and the
    /// submission preflight use `commitment`.
    pub fn new(rpc_url: &str, commitment: CommitmentLevel) -> Result<Self, SvmRpcError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .no_proxy()
            .build()
            .map_err(SvmRpcError::Client)?;

        let rpc_client = RpcClient::new_with_timeout_and_commitment(
            rpc_url.to_string(),
            REQUEST_TIMEOUT,
            CommitmentConfig { commitment },
        );

        Ok(Self {
            client,
            rpc_client,
            rpc_url: rpc_url.to_string(),
            commitment,
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn commitment(&self) -> CommitmentLevel {
        self.commitment
    }

    /// Fetches an account. Returns `None` if the account does not exist.
    pub async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<AccountData>, SvmRpcError> {
        const METHOD: &str = "getAccountInfo";
        let params = serde_json::json!([
            pubkey.to_string(),
            { "encoding": "base64", "commitment": self.commitment }
        ]);

        let result: RpcContextValue<Option<RpcAccount>> = self.call(METHOD, params).await?;
        let Some(account) = result.value else {
            return Ok(None);
        };

        let data = STANDARD
            .decode(&account.data.0)
            .map_err(|e| invalid(METHOD, format!("bad base64 account data: {}", e)))?;
        let owner = Pubkey::from_str(&account.owner)
            .map_err(|e| invalid(METHOD, format!("bad owner pubkey: {}", e)))?;

        Ok(Some(AccountData {
            lamports: account.lamports,
            owner,
            executable: account.executable,
            data,
        }))
    }

    /// Minimum lamports an account of `data_len` bytes needs to be rent exempt.
    pub async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, SvmRpcError> {
        let params = serde_json::json!([data_len, { "commitment": self.commitment }]);
        self.call("getMinimumBalanceForRentExemption", params).await
    }

    pub async fn get_latest_blockhash(&self) -> Result<Hash, SvmRpcError> {
        self.rpc_client
            .get_latest_blockhash()
            .await
            .map_err(|e| client_error("getLatestBlockhash", e))
    }

    /// Submits a signed transaction with preflight simulation enabled.
    /// The node answers as soon as the transaction is accepted; confirmation
    /// has to be polled separately via [`Self::get_signature_status`].
    pub async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, SvmRpcError> {
        debug!("SVM RPC sendTransaction -> {}", self.rpc_url);
        let config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(self.commitment),
            encoding: Some(UiTransactionEncoding::Base64),
            ..RpcSendTransactionConfig::default()
        };

        self.rpc_client
            .send_transaction_with_config(tx, config)
            .await
            .map_err(|e| client_error("sendTransaction", e))
    }

    /// Returns the status of a recent transaction, or `None` if the node has
    /// not seen it yet.
    pub async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, SvmRpcError> {
        let response = self
            .rpc_client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| client_error("getSignatureStatuses", e))?;

        Ok(response
            .value
            .into_iter()
            .next()
            .flatten()
            .map(SignatureStatus::from))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, SvmRpcError> {
        debug!("SVM RPC {} -> {}", method, self.rpc_url);

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        let response: JsonRpcResponse<T> = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|source| SvmRpcError::Transport {
                method: method.to_string(),
                source,
            })?
            .json()
            .await
            .map_err(|source| SvmRpcError::Transport {
                method: method.to_string(),
                source,
            })?;

        if let Some(error) = response.error {
            return Err(SvmRpcError::Rpc {
                method: method.to_string(),
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        response
            .result
            .ok_or_else(|| invalid(method, "missing result".to_string()))
    }
}

/// Keeps JSON-RPC error responses (preflight failures in particular) as
/// [`SvmRpcError::Rpc`]; everything else is a client failure.
fn client_error(method: &str, error: ClientError) -> SvmRpcError {
    if let ClientErrorKind::RpcError(RpcError::RpcResponseError { code, message, .. }) =
        error.kind()
    {
        return SvmRpcError::Rpc {
            method: method.to_string(),
            code: *code,
            message: message.clone(),
            data: None,
        };
    }
    SvmRpcError::SolanaClient {
        method: method.to_string(),
        source: Box::new(error),
    }
}

fn invalid(method: &str, reason: String) -> SvmRpcError {
    SvmRpcError::InvalidResponse {
        method: method.to_string(),
        reason,
    }
}

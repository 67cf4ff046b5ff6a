//! Error types

use chain_clients_svm::SvmRpcError;
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EscrowClientError {
    #[error("Invalid key material: {0}")]
    Authentication(String),

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Invalid amount '{0}': expected an unsigned 64-bit integer")]
    InvalidAmount(String),

    #[error("Account {0} not found")]
    AccountNotFound(Pubkey),

    #[error("Account {account} is not a usable token account: {reason}")]
    InvalidTokenAccount { account: Pubkey, reason: String },

    #[error("Account {account} is not an escrow record: {reason}")]
    InvalidEscrowAccount { account: Pubkey, reason: String },

    #[error("Escrow account {0} is not initialized")]
    NotInitialized(Pubkey),

    #[error("Transaction rejected: {0}")]
    Protocol(String),

    #[error("Transaction {signature} failed: {reason}")]
    TransactionFailed { signature: Signature, reason: String },

    #[error("Transaction {signature} not confirmed after {waited:?}")]
    NotYetConfirmed { signature: Signature, waited: Duration },

    #[error("Failed to decode escrow account: {0}")]
    Decode(String),

    #[error("Failed to build instruction: {0}")]
    Instruction(String),

    #[error(transparent)]
    Rpc(SvmRpcError),
}

impl From<SvmRpcError> for EscrowClientError {
    fn from(e: SvmRpcError) -> Self {
        if e.is_preflight_failure() {
            if let SvmRpcError::Rpc { message, .. } = &e {
                return EscrowClientError::Protocol(message.clone());
            }
        }
        EscrowClientError::Rpc(e)
    }
}

impl From<solana_program::program_error::ProgramError> for EscrowClientError {
    fn from(e: solana_program::program_error::ProgramError) -> Self {
        EscrowClientError::Instruction(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EscrowClientError>;

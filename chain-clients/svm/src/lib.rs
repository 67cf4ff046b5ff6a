//! Solana SVM JSON-RPC Client
//!
//! A minimal async client for the handful of Solana JSON-RPC methods the
//! escrow client needs: account reads, rent lookups, blockhash retrieval,
//! transaction submission and signature status polling. Every call carries an
//! explicit commitment level taken from the client configuration.

pub mod client;
pub mod error;

pub use client::{AccountData, ConfirmationStatus, SignatureStatus, SvmRpcClient};
pub use error::SvmRpcError;

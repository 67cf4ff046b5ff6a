//! Transaction confirmation polling
//!
//! Polls `getSignatureStatuses` until the transaction reaches the configured
//! commitment, fails on-chain, or the timeout elapses.

use chain_clients_svm::SvmRpcClient;
use solana_sdk::signature::Signature;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::NetworkConfig;
use crate::error::{EscrowClientError, Result};

/// Waits until `signature` reaches the client's commitment level.
///
/// # Returns
///
/// * `Ok(slot)` - Slot the transaction landed in
/// * `Err(TransactionFailed)` - The transaction executed with an error
/// * `Err(NotYetConfirmed)` - No sufficient confirmation within the timeout
pub async fn wait_for_confirmation(
    rpc: &SvmRpcClient,
    network: &NetworkConfig,
    signature: &Signature,
) -> Result<u64> {
    let started = Instant::now();
    let timeout = network.confirmation_timeout();
    let commitment = rpc.commitment();

    loop {
        match rpc.get_signature_status(signature).await? {
            Some(status) => {
                if let Some(err) = status.err {
                    warn!("Transaction {} failed in slot {}: {}", signature, status.slot, err);
                    return Err(EscrowClientError::TransactionFailed {
                        signature: *signature,
                        reason: err.to_string(),
                    });
                }

                let depth = status.confirmation_status;
                if depth.satisfies(commitment) {
                    info!(
                        "Transaction {} reached {:?} in slot {}",
                        signature, depth, status.slot
                    );
                    return Ok(status.slot);
                }
                debug!("Transaction {} at {:?}, waiting", signature, depth);
            }
            None => debug!("Transaction {} not yet visible", signature),
        }

        let waited = started.elapsed();
        if waited >= timeout {
            return Err(EscrowClientError::NotYetConfirmed {
                signature: *signature,
                waited,
            });
        }

        let remaining = timeout.saturating_sub(waited);
        tokio::time::sleep(network.poll_interval().min(remaining).max(Duration::from_millis(1))).await;
    }
}

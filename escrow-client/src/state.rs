//! Account state definitions

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use crate::error::{EscrowClientError, Result};

/// Escrow record written by the escrow program's `InitEscrow` instruction.
///
/// The layout is fixed-size with no discriminator. Field order is the wire
/// order; borsh encodes the flag as one byte, pubkeys as 32 raw bytes and the
/// amount as little-endian `u64`.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct EscrowRecord {
    /// Set once the program has initialized the record
    pub is_initialized: bool,
    /// Wallet that opened the trade
    pub initializer_pubkey: Pubkey,
    /// Temporary token account holding the offered tokens
    pub temp_token_account_pubkey: Pubkey,
    /// Initializer's token account that receives the counter-asset
    pub initializer_token_to_receive_account_pubkey: Pubkey,
    /// Counter-asset amount the initializer expects
    pub expected_amount: u64,
}

impl EscrowRecord {
    pub const LEN: usize = 1 + 32 + 32 + 32 + 8; // 105 bytes

    /// Decodes a record from raw account data.
    ///
    /// Fails unless `data` is exactly [`Self::LEN`] bytes and the flag byte
    /// is 0 or 1.
    pub fn unpack(data: &[u8]) -> Result<Self> {
        if data.len() != Self::LEN {
            return Err(EscrowClientError::Decode(format!(
                "expected {} bytes, got {}",
                Self::LEN,
                data.len()
            )));
        }
        Self::try_from_slice(data).map_err(|e| EscrowClientError::Decode(e.to_string()))
    }
}

/// Seeds for PDA derivation
pub mod seeds {
    /// The program signs for temp token accounts with the PDA of this seed.
    pub const ESCROW_SEED: &[u8] = b"escrow";
}

//! Signing key parsing
//!
//! Keys arrive as text: either the comma-separated byte list the Solana CLI
//! writes to keypair files (with or without the surrounding brackets), or a
//! base58 string of the same 64 bytes.

use serde::{Deserialize, Serialize};
use solana_sdk::signature::{Keypair, Signer};
use std::fmt;

use crate::error::{EscrowClientError, Result};

/// Length of an ed25519 keypair: 32-byte secret followed by 32-byte public key.
pub const KEYPAIR_LEN: usize = 64;

/// Raw signing key text as supplied by the caller. Never printed.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyMaterial(String);

impl KeyMaterial {
    pub fn new(material: impl Into<String>) -> Self {
        Self(material.into())
    }

    pub fn to_keypair(&self) -> Result<Keypair> {
        parse_key_material(&self.0)
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial(<redacted>)")
    }
}

/// Parses key material into a keypair.
///
/// Fails with [`EscrowClientError::Authentication`] if any value is not a
/// byte, the length is not 64, or the public half does not match the secret.
pub fn parse_key_material(material: &str) -> Result<Keypair> {
    let trimmed = material.trim();
    if trimmed.is_empty() {
        return Err(auth("empty key material"));
    }

    let bytes = if trimmed.contains(',') || trimmed.starts_with('[') {
        parse_byte_list(trimmed)?
    } else {
        bs58::decode(trimmed)
            .into_vec()
            .map_err(|e| auth(format!("invalid base58: {}", e)))?
    };

    if bytes.len() != KEYPAIR_LEN {
        return Err(auth(format!(
            "expected {} key bytes, got {}",
            KEYPAIR_LEN,
            bytes.len()
        )));
    }

    let mut secret = [0u8; 32];
    secret.copy_from_slice(&bytes[..32]);
    let keypair = Keypair::new_from_array(secret);
    if keypair.pubkey().to_bytes()[..] != bytes[32..] {
        return Err(auth("public key does not match secret key"));
    }
    Ok(keypair)
}

fn parse_byte_list(list: &str) -> Result<Vec<u8>> {
    let inner = list
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(list);

    inner
        .split(',')
        .map(str::trim)
        .enumerate()
        .map(|(index, value)| {
            value
                .parse::<u8>()
                .map_err(|_| auth(format!("value '{}' at position {} is not a byte", value, index)))
        })
        .collect()
}

fn auth(reason: impl Into<String>) -> EscrowClientError {
    EscrowClientError::Authentication(reason.into())
}

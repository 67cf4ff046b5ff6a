//! Token amount handling
//!
//! Amounts are `u64` end to end. Over JSON they travel as decimal strings so
//! that clients whose numbers are IEEE doubles never lose precision above
//! 2^53. Plain JSON integers are still accepted on input.

use serde::{de, Deserialize, Deserializer, Serializer};

use crate::error::{EscrowClientError, Result};

/// Parses a decimal amount, rejecting anything outside `u64`.
pub fn parse_amount(value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| EscrowClientError::InvalidAmount(value.to_string()))
}

pub fn serialize<S: Serializer>(amount: &u64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&amount.to_string())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Text(String),
        Number(u64),
    }

    match RawAmount::deserialize(deserializer)? {
        RawAmount::Text(text) => parse_amount(&text).map_err(de::Error::custom),
        RawAmount::Number(n) => Ok(n),
    }
}

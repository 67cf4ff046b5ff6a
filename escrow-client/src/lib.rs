//! Escrow client library
//!
//! Client for an external two-party SPL token escrow program. Opens trades,
//! completes them as the counterparty, reads trade records and serves the two
//! trade views over HTTP.

pub mod amount;
pub mod api;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod escrow;
pub mod instruction;
pub mod keys;
pub mod state;

// Re-export public types for convenience
pub use config::{EscrowClientConfig, NetworkConfig};
pub use error::EscrowClientError;
pub use escrow::{EscrowClient, EscrowSummary, InitiateEscrowRequest, TakeEscrowRequest, TakeSummary};
pub use keys::KeyMaterial;
pub use state::EscrowRecord;

//! REST API Server Module
//!
//! Serves the two trade views (`/` for the initiator, `/bob` for the
//! counterparty) and the JSON endpoints the views call to open, take and
//! inspect trades.

// Generic shared code (response envelope, rejection handling, CORS, server)
mod generic;

// Escrow endpoint handlers
mod escrow;

// Page router and lazily loaded views
pub mod views;

pub use generic::{ApiResponse, ApiServer};
pub use views::{Route, ViewRegistry};

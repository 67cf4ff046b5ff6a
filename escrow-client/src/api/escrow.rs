//! Escrow endpoint handlers

use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use warp::{http::StatusCode, Filter, Rejection, Reply};

use super::generic::ApiResponse;
use crate::error::EscrowClientError;
use crate::escrow::{EscrowClient, InitiateEscrowRequest, TakeEscrowRequest};

/// Query string for `GET /escrow/:pubkey`.
#[derive(Debug, Deserialize)]
pub struct EscrowQuery {
    pub program_id: String,
}

pub fn with_client(
    client: Arc<EscrowClient>,
) -> impl Filter<Extract = (Arc<EscrowClient>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || client.clone())
}

/// Accepts the `:pubkey` segment of `GET /escrow/:pubkey`. The action
/// segments belong to the POST routes, so a GET on them is left to report
/// 405 there.
pub async fn escrow_account_segment(segment: String) -> Result<String, Rejection> {
    match segment.as_str() {
        "initiate" | "take" => Err(warp::reject::not_found()),
        _ => Ok(segment),
    }
}

/// Maps a client error to the HTTP status the API reports it with.
pub fn error_status(error: &EscrowClientError) -> StatusCode {
    match error {
        EscrowClientError::Authentication(_)
        | EscrowClientError::InvalidAddress(_)
        | EscrowClientError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
        EscrowClientError::AccountNotFound(_) => StatusCode::NOT_FOUND,
        EscrowClientError::InvalidTokenAccount { .. }
        | EscrowClientError::InvalidEscrowAccount { .. }
        | EscrowClientError::NotInitialized(_)
        | EscrowClientError::Protocol(_)
        | EscrowClientError::TransactionFailed { .. }
        | EscrowClientError::Decode(_)
        | EscrowClientError::Instruction(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EscrowClientError::NotYetConfirmed { .. } => StatusCode::GATEWAY_TIMEOUT,
        EscrowClientError::Rpc(_) => StatusCode::BAD_GATEWAY,
    }
}

fn reply_with<T: serde::Serialize>(
    result: Result<T, EscrowClientError>,
    operation: &str,
) -> warp::reply::WithStatus<warp::reply::Json> {
    match result {
        Ok(data) => warp::reply::with_status(
            warp::reply::json(&ApiResponse::ok(data)),
            StatusCode::OK,
        ),
        Err(e) => {
            error!("{} failed: {}", operation, e);
            warp::reply::with_status(
                warp::reply::json(&ApiResponse::<()>::err(e.to_string())),
                error_status(&e),
            )
        }
    }
}

pub async fn initiate_escrow_handler(
    request: InitiateEscrowRequest,
    client: Arc<EscrowClient>,
) -> Result<impl Reply, Rejection> {
    info!(
        "POST /escrow/initiate offered={} expected={}",
        request.offered_token_account, request.expected_amount
    );
    let result = client.initiate_escrow(&request).await;
    Ok(reply_with(result, "Escrow initiation"))
}

pub async fn take_escrow_handler(
    request: TakeEscrowRequest,
    client: Arc<EscrowClient>,
) -> Result<impl Reply, Rejection> {
    info!("POST /escrow/take escrow={}", request.escrow_account);
    let result = client.take_escrow(&request).await;
    Ok(reply_with(result, "Escrow exchange"))
}

pub async fn get_escrow_handler(
    escrow_account: String,
    query: EscrowQuery,
    client: Arc<EscrowClient>,
) -> Result<impl Reply, Rejection> {
    let result = client.get_escrow(&escrow_account, &query.program_id).await;
    Ok(reply_with(result, "Escrow lookup"))
}

//! Generic API structures and handlers
//!
//! Shared response envelope, rejection handling, CORS and the server itself.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use warp::{
    http::{Method, StatusCode},
    path::FullPath,
    Filter, Rejection, Reply,
};

use super::escrow;
use super::views::{Route, ViewRegistry};
use crate::config::EscrowClientConfig;
use crate::escrow::EscrowClient;

// ============================================================================
// SHARED REQUEST/RESPONSE STRUCTURES
// ============================================================================

/// Standardized response structure for all JSON endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    pub data: Option<T>,
    /// Error message (if failed)
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// ============================================================================
// CUSTOM REJECTION TYPES
// ============================================================================

/// A view file could not be read
#[derive(Debug)]
pub struct ViewUnavailable(pub String);

impl warp::reject::Reject for ViewUnavailable {}

// ============================================================================
// VIEW HANDLER
// ============================================================================

async fn view_handler(
    path: FullPath,
    views: Arc<ViewRegistry>,
) -> Result<warp::reply::Html<String>, Rejection> {
    let Some(route) = Route::resolve(path.as_str()) else {
        return Err(warp::reject::not_found());
    };

    match views.load(route).await {
        Ok(html) => Ok(warp::reply::html(html.to_string())),
        Err(e) => {
            error!("Failed to load {} view: {}", route.name(), e);
            Err(warp::reject::custom(ViewUnavailable(format!(
                "{} view unavailable",
                route.name()
            ))))
        }
    }
}

// ============================================================================
// CORS CONFIGURATION
// ============================================================================

/// Creates a CORS filter based on the configured allowed origins. Only
/// installed when at least one origin is configured.
fn create_cors_filter(allowed_origins: &[String]) -> warp::cors::Builder {
    let methods = vec![Method::GET, Method::POST, Method::OPTIONS];

    if allowed_origins.contains(&"*".to_string()) {
        warp::cors()
            .allow_any_origin()
            .allow_methods(methods.clone())
            .allow_headers(vec!["content-type"])
    } else {
        let origins: Vec<&str> = allowed_origins.iter().map(|s| s.as_str()).collect();
        warp::cors()
            .allow_origins(origins)
            .allow_methods(methods)
            .allow_headers(vec!["content-type"])
    }
}

// ============================================================================
// REJECTION HANDLER
// ============================================================================

/// Converts warp rejections into the standard error envelope.
pub async fn handle_rejection(rej: Rejection) -> Result<impl Reply, std::convert::Infallible> {
    let (status, message) = if let Some(err) = rej.find::<ViewUnavailable>() {
        (StatusCode::INTERNAL_SERVER_ERROR, err.0.clone())
    } else if let Some(err) = rej.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", err))
    } else if let Some(err) = rej.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, format!("Invalid query: {}", err))
    } else if let Some(err) = rej.find::<warp::cors::CorsForbidden>() {
        (StatusCode::FORBIDDEN, err.to_string())
    } else if rej.is_not_found() {
        (StatusCode::NOT_FOUND, "Endpoint not found".to_string())
    } else if rej.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        error!("Unhandled rejection: {:?}", rej);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::<()>::err(message)),
        status,
    ))
}

// ============================================================================
// API SERVER IMPLEMENTATION
// ============================================================================

pub struct ApiServer {
    config: Arc<EscrowClientConfig>,
    client: Arc<EscrowClient>,
    views: Arc<ViewRegistry>,
}

impl ApiServer {
    pub fn new(config: EscrowClientConfig) -> Result<Self> {
        let client = EscrowClient::new(&config.network).context("Failed to create escrow client")?;
        let views = ViewRegistry::new(&config.views.dir);

        Ok(Self {
            config: Arc::new(config),
            client: Arc::new(client),
            views: Arc::new(views),
        })
    }

    /// Binds the configured address and serves until the process exits.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting API server on {}:{}",
            self.config.api.host, self.config.api.port
        );

        let routes = self.create_routes();

        let addr: std::net::SocketAddr = format!("{}:{}", self.config.api.host, self.config.api.port)
            .parse()
            .context("Failed to parse API server address")?;

        warp::serve(routes).run(addr).await;

        Ok(())
    }

    pub(crate) fn create_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        let client = self.client.clone();
        let views = self.views.clone();

        let health = warp::path("health").and(warp::get()).map(|| {
            warp::reply::json(&ApiResponse::ok("Escrow client is running".to_string()))
        });

        // POST /escrow/initiate - open a trade
        let initiate = warp::path!("escrow" / "initiate")
            .and(warp::post())
            .and(warp::body::json())
            .and(escrow::with_client(client.clone()))
            .and_then(escrow::initiate_escrow_handler);

        // POST /escrow/take - complete a trade as the counterparty
        let take = warp::path!("escrow" / "take")
            .and(warp::post())
            .and(warp::body::json())
            .and(escrow::with_client(client.clone()))
            .and_then(escrow::take_escrow_handler);

        // GET /escrow/:pubkey?program_id=... - read a trade record
        let get_escrow = warp::path!("escrow" / String)
            .and(warp::get())
            .and_then(escrow::escrow_account_segment)
            .and(warp::query::<escrow::EscrowQuery>())
            .and(escrow::with_client(client))
            .and_then(escrow::get_escrow_handler);

        // GET / and GET /bob - the two trade views
        let view = warp::get()
            .and(warp::path::full())
            .and(warp::any().map(move || views.clone()))
            .and_then(view_handler);

        let routes = health
            .or(initiate)
            .or(take)
            .or(get_escrow)
            .or(view)
            .map(|reply| Box::new(reply) as Box<dyn Reply>);

        let cors_origins = &self.config.api.cors_origins;
        let routes = if cors_origins.is_empty() {
            routes.boxed()
        } else {
            routes
                .with(create_cors_filter(cors_origins))
                .map(|reply| Box::new(reply) as Box<dyn Reply>)
                .boxed()
        };

        routes.recover(handle_rejection)
    }

    /// Exposes routes for integration tests
    pub fn test_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        self.create_routes()
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }
}

// rest_api/src/lib.rs

use axum::{
    extract::FromRef,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use anyhow::{Context, Error as AnyhowError};
use serde_json::{json, Value};
use std::future::Future;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use lib::errors::AccessError;
use lib::prescription_service::PrescriptionService;
use lib::storage_engine::create_storage;
use security::JwtSecret;

pub mod admin;
pub mod config;
pub mod prescriptions;

use crate::config::RestApiConfig;

// Define the REST API error enum
#[derive(Debug, Error)]
pub enum RestApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl RestApiError {
    /// Maps a service failure onto an HTTP error.
    ///
    /// Storage faults are logged with `action` for context and replaced by
    /// `server_message`; their detail never reaches the client.
    pub fn from_access(err: AccessError, action: &str, server_message: &str) -> Self {
        match err {
            AccessError::Forbidden(msg) => RestApiError::Forbidden(msg.to_string()),
            AccessError::Unauthorized(msg) => RestApiError::Unauthorized(msg.to_string()),
            AccessError::NotFound(msg) => RestApiError::NotFound(msg.to_string()),
            AccessError::InvalidPayload(msg) => RestApiError::BadRequest(msg),
            AccessError::Storage(e) => {
                error!("Error {}: {}", action, e);
                RestApiError::Internal(server_message.to_string())
            }
        }
    }
}

// Implement IntoResponse for RestApiError to convert it into an HTTP response
impl IntoResponse for RestApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            RestApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            RestApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            RestApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            RestApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            RestApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "status": "error",
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

// Shared state for the Axum application
#[derive(Clone)]
pub struct AppState {
    pub service: PrescriptionService,
    pub jwt_secret: JwtSecret,
}

impl AppState {
    pub fn new(service: PrescriptionService, jwt_secret: JwtSecret) -> Self {
        Self { service, jwt_secret }
    }
}

impl FromRef<AppState> for JwtSecret {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_secret.clone()
    }
}

// Handler for the /api/health endpoint
async fn health_check_handler() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "message": "Prescriptions API is healthy" })))
}

/// Builds the application router over `state`.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .merge(prescriptions::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Opens the configured storage, applies `seed_file` if set, and builds the router state.
pub async fn build_state(config: &RestApiConfig) -> Result<AppState, AnyhowError> {
    let storage = create_storage(&config.storage)
        .context("Failed to initialize storage for REST API")?;
    if let Some(path) = &config.seed_file {
        admin::seed_directory(storage.users.as_ref(), path).await?;
    }
    Ok(AppState::new(
        PrescriptionService::from_storage(storage),
        JwtSecret::new(config.auth.jwt_secret.clone()),
    ))
}

// Main function to start the REST API server
pub async fn start_server<F>(config: RestApiConfig, shutdown_signal: F) -> Result<(), AnyhowError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if config.uses_default_secret() {
        warn!("Using the built-in JWT secret; set PRESCRIPTIONS_JWT_SECRET for any real deployment");
    }

    let state = build_state(&config).await?;
    let app = app_router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;
    info!("REST API server listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("REST API server failed to start or run")?;

    info!("REST API server stopped.");
    Ok(())
}

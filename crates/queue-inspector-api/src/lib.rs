//! # Queue Inspector API
//!
//! HTTP front-end for the inspection client. Same semantics as the MCP
//! tools, with JSON responses:
//!
//! - `GET /messages?from&to` - live message summaries
//! - `GET /deadletters?from&to` - dead-letter message summaries
//! - `GET /message?seq&deadletter` - one full message
//! - `GET /health` - liveness and configured entities
//!
//! Errors are returned with a non-2xx status and the error text as body.

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use queue_inspector_core::{
    InspectorClient, MessageDetails, MessageSummary, SequenceNumber, ServerSettings, TimeRange,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, instrument};

pub mod errors;
pub mod responses;

pub use errors::{ApiError, ServiceError};
pub use responses::{HealthResponse, ListQuery, MessageQuery};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

// ============================================================================
// Application State
// ============================================================================

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<InspectorClient>,
}

impl AppState {
    pub fn new(client: Arc<InspectorClient>) -> Self {
        Self { client }
    }
}

// ============================================================================
// Router and Server
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/messages", get(handle_list_messages))
        .route("/deadletters", get(handle_list_dead_letters))
        .route("/message", get(handle_fetch_message))
        .route("/health", get(handle_health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Bind to the configured address and serve until Ctrl+C or SIGTERM
pub async fn start_server(
    client: Arc<InspectorClient>,
    settings: &ServerSettings,
) -> Result<(), ServiceError> {
    let address = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: address.clone(),
            message: e.to_string(),
        })?;

    info!("Starting HTTP server on {}", address);
    serve(listener, client, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` completes. In-flight
/// requests are allowed to finish.
pub async fn serve<F>(
    listener: TcpListener,
    client: Arc<InspectorClient>,
    shutdown: F,
) -> Result<(), ServiceError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(AppState::new(client));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Completes on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

// ============================================================================
// Inspection Handlers
// ============================================================================

#[instrument(skip(state))]
async fn handle_list_messages(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<MessageSummary>>, ApiError> {
    let range = TimeRange::parse(query.from.as_deref(), query.to.as_deref())?;
    let messages = state.client.list_messages(&range).await?;
    Ok(Json(messages))
}

#[instrument(skip(state))]
async fn handle_list_dead_letters(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<MessageSummary>>, ApiError> {
    let range = TimeRange::parse(query.from.as_deref(), query.to.as_deref())?;
    let messages = state.client.list_dead_letters(&range).await?;
    Ok(Json(messages))
}

#[instrument(skip(state))]
async fn handle_fetch_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<Json<MessageDetails>, ApiError> {
    let sequence = parse_sequence(query.seq.as_deref())?;
    let message = state
        .client
        .fetch_message(sequence, query.dead_letter())
        .await?;
    Ok(Json(message.to_details()))
}

fn parse_sequence(raw: Option<&str>) -> Result<SequenceNumber, ApiError> {
    let raw = raw.unwrap_or_default();
    if raw.is_empty() {
        return Err(ApiError::MissingSequence);
    }
    raw.parse().map_err(|_| ApiError::InvalidSequence {
        value: raw.to_string(),
    })
}

// ============================================================================
// Health Check Handler
// ============================================================================

#[instrument(skip(state))]
async fn handle_health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let targets = state.client.targets();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: state.client.provider_name().to_string(),
        live_entity: targets.live().ok().map(|t| t.entity_path()),
        dead_letter_entity: targets.dead_letter().ok().map(|t| t.entity_path()),
        timestamp: chrono::Utc::now(),
    })
}

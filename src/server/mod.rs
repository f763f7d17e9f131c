//! HTTP server for the client portal chat core
//!
//! Exposes the chat proxy and its supporting operations:
//! - GET  /api/status - Health check
//! - POST /api/chat - Chat proxy (model fallback)
//! - GET  /api/history - Transcript projection for a visitor
//! - GET  /api/quote - Price quotation from configured base prices
//! - DELETE /api/admin/conversations/{session_id} - Bulk delete a conversation
//! - GET/PUT /api/admin/config/instructions - System prompt
//! - GET/PUT /api/admin/config/prices - Base prices

pub mod auth;
mod handlers;
pub mod types;

pub use handlers::DEFAULT_INSTRUCTIONS;

use anyhow::Result;
use axum::{
    Router,
    http::{Method, header},
    routing::{delete, get, post},
};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::CONFIG;
use crate::llm::GenerativeBackend;
use crate::llm::fallback::FallbackPolicy;

// ============================================================================
// Server State
// ============================================================================

/// Shared state for the handlers. The proxy itself is stateless between
/// invocations; everything here is either a connection pool or immutable.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub backend: Arc<dyn GenerativeBackend>,
    pub fallback: FallbackPolicy,
    /// Cancelled on shutdown; each chat invocation derives a child token.
    pub shutdown: CancellationToken,
}

// ============================================================================
// Routes
// ============================================================================

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/api/status", get(handlers::status_handler))
        .route("/api/chat", post(handlers::chat_handler))
        .route("/api/history", get(handlers::history_handler))
        .route("/api/quote", get(handlers::quote_handler))
        .route(
            "/api/admin/conversations/{session_id}",
            delete(handlers::delete_conversation_handler),
        )
        .route(
            "/api/admin/config/instructions",
            get(handlers::instructions_handler).put(handlers::update_instructions_handler),
        )
        .route(
            "/api/admin/config/prices",
            get(handlers::prices_handler).put(handlers::update_prices_handler),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(CONFIG.request_timeout)))
                .layer(cors),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(db: SqlitePool, backend: Arc<dyn GenerativeBackend>) -> Result<()> {
    let state = AppState {
        db,
        backend,
        fallback: FallbackPolicy::from_config(),
        shutdown: CancellationToken::new(),
    };
    let shutdown = state.shutdown.clone();
    let app = create_router(state);

    let bind_address = CONFIG.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("chat service listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

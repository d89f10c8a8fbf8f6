//! HTTP trigger for reconciliation passes and bulk imports.
//!
//! The trigger keeps no state between requests besides its configuration
//! and a lock: every request opens fresh store handles and runs the blocking
//! work on the Tokio blocking pool while holding the lock, so two requests
//! never load and save the store files at the same time. Processes other than
//! this server (the CLI, a second server) are not covered by the lock.

use std::sync::Arc;

use axum::Router;
use tokio::sync::Mutex;
use axum::routing::{any, get, post};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::smartfilm::crm::config::ServerConfig;
use crate::smartfilm::crm::error::Result;

pub mod handlers;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Held for the whole of each request's store work.
    pub store_lock: Arc<Mutex<()>>,
}

pub fn create_app(config: ServerConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        store_lock: Arc::new(Mutex::new(())),
    };

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/sync-sheets", any(handlers::sync_sheets))
        .route("/api/leads/import", post(handlers::import_leads))
        .route("/api/quote", post(handlers::submit_quote))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until the process stops.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let bind = config.bind;
    let app = create_app(config);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(%bind, "sync trigger listening");
    axum::serve(listener, app).await?;
    Ok(())
}

//! HTTP gateway for GemRelay.
//!
//! Serves the chat API, the embedded landing/login pages and stylesheet,
//! and falls back to a public asset directory for every other path.
//!
//! Built on Axum.

pub mod api;
pub mod frontend;

use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

use gemrelay_chat::PromptManager;
use gemrelay_config::AppConfig;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub manager: Arc<PromptManager>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the full router.
///
/// Layers applied:
/// - Request body size limit (`gateway.max_body_bytes`)
/// - Permissive CORS when `gateway.cors_allow_any` is set
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let gateway = &state.config.gateway;
    let public_dir = gateway.public_dir.clone();
    let max_body_bytes = gateway.max_body_bytes;
    let cors_allow_any = gateway.cors_allow_any;

    let router = Router::new()
        .route("/health", get(health_handler))
        .merge(api::api_router())
        .with_state(state)
        .merge(frontend::frontend_router())
        .fallback_service(ServeDir::new(public_dir))
        .layer(DefaultBodyLimit::max(max_body_bytes));

    let router = if cors_allow_any {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// Builds the provider first so a missing credential stops the process
/// before a port is bound.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let provider = gemrelay_providers::build_from_config(&config)?;
    let manager = Arc::new(PromptManager::from_config(provider, &config));
    let addr = config.bind_addr();

    info!(
        addr = %addr,
        model = %manager.model(),
        public_dir = %config.gateway.public_dir.display(),
        "Gateway starting"
    );

    let app = build_router(Arc::new(GatewayState { config, manager }));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

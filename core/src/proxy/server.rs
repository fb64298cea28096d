//! Gateway Server - Axum HTTP server

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{CategoriesConfig, Config};
use crate::proxy::handlers;
use crate::proxy::upstream::UpstreamClient;

/// Chat requests are small JSON documents
const MAX_CHAT_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across handlers. Immutable; nothing is shared between requests
/// except the pooled HTTP client.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    pub categories: Arc<CategoriesConfig>,
    pub log_stream_chunks: bool,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            upstream: Arc::new(UpstreamClient::new(config)?),
            categories: Arc::new(config.categories.clone()),
            log_stream_chunks: config.logging.log_stream_chunks,
        })
    }
}

/// All gateway routes
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/healthz", get(health_check_handler))
        .route("/health", get(health_check_handler))

        // Chat relay to the agent
        .route("/api/copilotkit", post(handlers::chat::handle_chat))

        // Source document downloads
        .route("/api/download/*path", get(handlers::download::handle_download))

        // Streaming smoke test, no backend involved
        .route("/api/test", get(handlers::demo::handle_test_stream))

        .route("/api/categories", get(handlers::categories::handle_categories))

        .layer(DefaultBodyLimit::max(MAX_CHAT_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Gateway server instance
pub struct ProxyServer {
    host: String,
    port: u16,
    state: AppState,
}

impl ProxyServer {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            host: config.server.host.clone(),
            port: config.server.port,
            state: AppState::from_config(config)?,
        })
    }

    /// Run the gateway (blocking)
    pub async fn run(self) -> anyhow::Result<()> {
        let agent_url = self.state.upstream.agent_url().to_string();
        let app = build_router(self.state);

        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("Gateway listening on {} (agent: {})", addr, agent_url);

        // Handle graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

/// Health check handler
async fn health_check_handler() -> Response {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response()
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

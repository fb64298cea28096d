use std::path::PathBuf;

use ragchat_core::category;
use ragchat_core::config::load_config;
use ragchat_core::proxy::ProxyServer;

pub async fn run(config_path: Option<PathBuf>, port_override: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    let mut config = load_config(config_path)?;

    // Apply port override if provided
    if let Some(port) = port_override {
        config.server.port = port;
    }

    tracing::info!("Starting RAG chat gateway...");
    tracing::info!("  Port: {}", config.server.port);
    tracing::info!("  Host: {}", config.server.host);
    tracing::info!("  Backend: {}", config.backend.base_url);
    if config.logging.log_stream_chunks {
        tracing::info!("  Chunk logging: on");
    }

    // Surface category problems at startup rather than on first request
    let categories = category::from_settings(&config.categories);
    tracing::info!(
        "  Categories: {} (default: {})",
        categories.categories.len(),
        categories.default_category
    );

    let server = ProxyServer::new(&config)?;

    tracing::info!("Gateway starting on http://{}:{}", config.server.host, config.server.port);
    tracing::info!("Press Ctrl+C to stop");

    // Run server (blocks until shutdown)
    server.run().await?;

    Ok(())
}

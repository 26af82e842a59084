//! Deskmate - help desk chat front-end
//!
//! Serves a chat page with two modes: document search, which points the
//! user at the internal document most likely to answer them, and inquiry,
//! which answers directly from internal documents. Answers come from an LLM.

mod api;
mod config;
mod dispatch;
mod error;
mod flow;
mod init;
mod llm;
mod present;
mod render;
mod session;
mod telemetry;
#[cfg(test)]
mod testing;

use api::{create_router, AppState};
use config::AppConfig;
use dispatch::ResponseDispatcher;
use flow::ChatFlow;
use init::Initializer;
use llm::{LlmConfig, ModelRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration
    let config = AppConfig::from_env()?;

    // Initialize logging
    telemetry::init(config.log_dir.as_deref())?;

    // Initialize LLM registry
    let llm_registry = Arc::new(ModelRegistry::new(&config.llm));

    if llm_registry.has_models() {
        tracing::info!(
            models = ?llm_registry.available_models(),
            default = %llm_registry.default_model_id(),
            "LLM registry initialized"
        );
    } else {
        // Pages will show the initialization error until a key is set
        tracing::warn!(
            "No LLM API keys configured. Set {}.",
            LlmConfig::credential_hint()
        );
    }

    // Create application state
    let flow = ChatFlow::new(
        Initializer::new(&config, Arc::clone(&llm_registry)),
        ResponseDispatcher::new(Arc::clone(&llm_registry), config.history_limit),
    );
    let state = AppState::new(flow, llm_registry);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        default_mode = %config.default_mode,
        history_limit = config.history_limit,
        "Deskmate server listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

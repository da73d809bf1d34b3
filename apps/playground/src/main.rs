mod config;
mod errors;
mod llm_client;
mod postprocess;
mod prompt;
mod routes;
mod session;
mod state;
mod template;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::store::{BlobStore, FileBlobStore, MemoryBlobStore};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Prompt Playground v{}", env!("CARGO_PKG_VERSION"));

    // Initialize session blob store
    let store: Arc<dyn BlobStore> = match &config.store_dir {
        Some(dir) => {
            let store = FileBlobStore::open(dir).with_context(|| {
                format!("Failed to open session store at {}", dir.display())
            })?;
            info!("Session store at {}", dir.display());
            Arc::new(store)
        }
        None => {
            warn!("STORE_DIR is empty; session state will not survive a restart");
            Arc::new(MemoryBlobStore::default())
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new().context("Failed to build HTTP client")?;
    info!(
        "LLM client initialized (default provider: {}, keys: openai={}, gemini={})",
        config.default_provider,
        config.openai_api_key.is_some(),
        config.gemini_api_key.is_some()
    );

    let state = AppState::new(Arc::new(llm), store, config.clone());

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

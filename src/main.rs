use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coachrelay::{config::ServerConfig, llm, routes, state::AppState};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coachrelay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting coach relay...");

    let server_config = ServerConfig::from_env();

    // A missing credential is not fatal: assistant calls fall back instead
    let llm_config = llm::LlmConfig::from_env();
    let llm_provider = match llm_config.build_provider() {
        Ok(provider) => {
            tracing::info!(
                "Assistant provider {} initialized ({})",
                provider.name(),
                llm_config.openai_model
            );
            Some(provider)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize assistant provider: {}. Assistant replies will fall back.",
                e
            );
            None
        }
    };

    let state = Arc::new(AppState::new_with_llm(llm_provider, llm_config));
    let app = routes::router(state, &server_config);

    let addr = server_config.socket_addr();
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

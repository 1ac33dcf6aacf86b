use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cryptic_tales::{api, broadcast::ChannelBroadcaster, llm, state::AppState, store::MemoryStore, ws};

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
                .unwrap_or_else(|_| "cryptic_tales=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Cryptic Tales...");

    // Initialize the story provider
    let llm_config = llm::LlmConfig::from_env();
    let storyteller = match llm_config.build_provider() {
        Ok(provider) => {
            tracing::info!("Story provider initialized successfully");
            Some(provider)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize story provider: {}. Clue generation will not be available.",
                e
            );
            None
        }
    };

    let channel = Arc::new(ChannelBroadcaster::default());
    let state = Arc::new(AppState::new(
        Arc::new(MemoryStore::new()),
        channel.clone(),
        storyteller,
    ));

    let app = api::router(state)
        .merge(ws::router(channel))
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

// API Server Binary Entry Point
//
// Purpose: Load the model once and serve predictions over HTTP
// Usage: cargo run --features api --bin api_server

use fishzone::config::ServerConfig;
use fishzone::{create_router, AppState};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "fishzone=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    let config = ServerConfig::from_env()?;

    tracing::info!("Configuration:");
    tracing::info!("  MODEL_DIR: {:?}", config.model_dir);
    tracing::info!("  PORT: {}", config.port);
    tracing::info!("  HISTORY_PATH: {:?}", config.history_path);
    tracing::info!("  HISTORY_CAPACITY: {}", config.history_capacity);
    tracing::info!("  OUT_OF_BOUNDS_GPS: {:?}", config.gps_policy);

    // Model and encoder are loaded once here and never reloaded
    let state = AppState::new(&config)?;
    tracing::info!("Application state initialized successfully");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

//! Pandera Relay Server
//!
//! Run with: cargo run -p pandera-relay

use pandera_config::Config;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Pandera relay...");

    let config = Config::load()?;

    // Create app state
    let state = pandera_relay::state::AppState::new(&config.relay)?;
    info!(downstream = %state.downstream_url, "Forwarding compute requests");

    // Build router
    let app = pandera_relay::router::build_router(state);

    // Bind to port
    let addr: SocketAddr = format!("{}:{}", config.relay.host, config.relay.port).parse()?;
    info!("Relay listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use funnel_core::config::Config;
use funnel_core::store::spawn_sweeper;
use funnel_core::{AppState, create_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if !config.gateway_configured() {
        tracing::warn!("gateway credentials not set, running in mock PIX mode");
    }
    if config.utmify_api_token.is_none() {
        tracing::warn!("attribution token not set, events will be dropped");
    }

    let state = AppState::from_config(config.clone());

    // Background TTL eviction for the payment-status store.
    spawn_sweeper(
        state.store.clone(),
        config.sweep_interval,
        config.status_retention,
    );

    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

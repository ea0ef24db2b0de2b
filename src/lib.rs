pub mod api;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod services;
pub mod state;

use tokio::signal;

pub use config::Config;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = api::create_app_state_from_config(config).await?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Platter API listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

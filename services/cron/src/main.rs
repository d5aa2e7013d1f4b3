use anyhow::Result;
use dotenvy::dotenv;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use gridscout_cron::config::Config;
use gridscout_cron::scheduler::job;
use gridscout_cron::{health, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gridscout_cron=debug,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!(environment = %config.environment, dedup_mode = ?config.limits.dedup_mode, "Loaded configuration");

    let state = AppState::new(&config).await?;
    let job = job::start(Arc::clone(&state.scheduler), &config.limits);

    let app = health::router(Arc::clone(&state.scheduler));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting health server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
    });

    tokio::select! {
        result = server.into_future() => result?,
        result = job => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Job runner stopped");
            }
        }
    }

    info!("Shutting down");
    Ok(())
}

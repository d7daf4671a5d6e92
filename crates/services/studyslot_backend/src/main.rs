// File: services/studyslot_backend/src/main.rs
use std::sync::Arc;
use std::time::Duration;
use studyslot_backend::{app, build_state, spawn_expiry_sweeper};
use studyslot_common::log_result;
use studyslot_config::load_config;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    studyslot_common::init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(log_result(
        load_config(),
        "Configuration loaded",
        "Failed to load configuration",
    )?);
    let state = build_state(config.clone()).await?;

    let sweep_every = Duration::from_secs(config.scheduling.expiry_sweep_secs.max(1));
    spawn_expiry_sweeper(state.bookings.clone(), sweep_every);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app(state).into_make_service()).await?;
    Ok(())
}

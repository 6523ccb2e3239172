//! Headless host for the ecolife simulation.
//!
//! Usage: `ecolife-runner [config.json]`. Without a path the defaults are used.

mod driver;
mod telemetry;

use anyhow::{Context, Result};
use driver::Driver;
use ecolife_core::RunnerConfig;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => RunnerConfig::from_json_file(&path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => RunnerConfig::default(),
    };

    telemetry::init_telemetry(config.json_logs)?;

    info!(
        width = config.sim.world.width,
        height = config.sim.world.height,
        seed = config.sim.seed,
        tick_ms = config.tick_ms,
        "Starting ecolife runner"
    );

    let driver = Arc::new(Driver::new(config)?);
    let (stop_tx, stop_rx) = watch::channel(false);

    let reporter = {
        let driver = driver.clone();
        let stop = stop_rx.clone();
        tokio::spawn(async move { driver.report(stop).await })
    };

    let mut ticker = {
        let driver = driver.clone();
        tokio::spawn(async move { driver.run(stop_rx).await })
    };

    let ticks = tokio::select! {
        result = &mut ticker => result?,
        _ = shutdown_signal() => {
            let _ = stop_tx.send(true);
            (&mut ticker).await?
        }
    };

    let _ = stop_tx.send(true);
    if let Err(e) = reporter.await {
        error!("Reporter task failed: {}", e);
    }

    let stats = driver.simulation().read().stats();
    info!(ticks, population = stats.population, "Shutting down runner");

    driver.save_snapshot()?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

use anyhow::Result;
use dotenv::dotenv;
use price_updater_rust::{logging, PriceUpdater, PriceUpdaterConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(logging::env_filter())
        .init();

    info!("Starting price_updater_rust...");

    let config = PriceUpdaterConfig::from_env()?;
    info!(
        "Update interval: {}s, cycle timeout: {}s, upstream: {}",
        config.update_interval_secs, config.cycle_timeout_secs, config.wiki_base_url
    );

    let updater = PriceUpdater::new(&config)?;
    let store = updater.store();

    let handle = updater.start().await;
    info!("Tracking {} items after initial update", store.len());

    // Wait for signal
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal");
        }
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
        }
    }

    handle.stop().await;
    info!("Shutdown complete ({} items tracked)", store.len());

    Ok(())
}

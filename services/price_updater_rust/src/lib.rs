//! price_updater_rust - Periodic Grand Exchange price ingestion

pub mod config;
pub mod logging;
pub mod updater;

pub use config::PriceUpdaterConfig;
pub use updater::PriceUpdater;

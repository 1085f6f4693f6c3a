//! Subscriber filter for the price updater binary

use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset or unparsable
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Filter from `RUST_LOG`, falling back to `info`.
pub fn env_filter() -> EnvFilter {
    filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

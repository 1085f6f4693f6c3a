//! Configuration for price_updater_rust

use anyhow::{anyhow, Result};
use flip_core::clients::osrs_wiki::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use flip_core::store::DEFAULT_MAX_HISTORY_PER_ITEM;
use flip_core::{OsrsWikiConfig, SchedulerConfig, StoreConfig};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PriceUpdaterConfig {
    // Scheduling
    pub update_interval_secs: u64,
    pub cycle_timeout_secs: u64,

    // Upstream
    pub wiki_base_url: String,
    pub wiki_user_agent: String,
    pub wiki_timeout_ms: u64,
    pub snapshot_cache_ttl_secs: u64,

    // Retention (0 = unbounded)
    pub history_max_points_per_item: usize,
}

impl Default for PriceUpdaterConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: 300,
            cycle_timeout_secs: 30,
            wiki_base_url: DEFAULT_BASE_URL.to_string(),
            wiki_user_agent: DEFAULT_USER_AGENT.to_string(),
            wiki_timeout_ms: 10_000,
            snapshot_cache_ttl_secs: 60,
            history_max_points_per_item: DEFAULT_MAX_HISTORY_PER_ITEM,
        }
    }
}

impl PriceUpdaterConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            update_interval_secs: parse_u64("PRICE_UPDATE_INTERVAL_SECS", defaults.update_interval_secs)?,
            cycle_timeout_secs: parse_u64("PRICE_CYCLE_TIMEOUT_SECS", defaults.cycle_timeout_secs)?,

            wiki_base_url: env::var("OSRS_WIKI_BASE_URL").unwrap_or(defaults.wiki_base_url),
            wiki_user_agent: env::var("OSRS_WIKI_USER_AGENT").unwrap_or(defaults.wiki_user_agent),
            wiki_timeout_ms: parse_u64("OSRS_WIKI_TIMEOUT_MS", defaults.wiki_timeout_ms)?,
            snapshot_cache_ttl_secs: parse_u64_any(
                &["OSRS_WIKI_CACHE_TTL_SECS", "OSRS_WIKI_CACHE_TTL_SEC"],
                defaults.snapshot_cache_ttl_secs,
            )?,

            history_max_points_per_item: parse_usize(
                "HISTORY_MAX_POINTS_PER_ITEM",
                defaults.history_max_points_per_item,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.update_interval_secs == 0 {
            return Err(anyhow!("PRICE_UPDATE_INTERVAL_SECS must be > 0"));
        }
        if self.cycle_timeout_secs == 0 {
            return Err(anyhow!("PRICE_CYCLE_TIMEOUT_SECS must be > 0"));
        }
        if self.cycle_timeout_secs > self.update_interval_secs {
            return Err(anyhow!(
                "PRICE_CYCLE_TIMEOUT_SECS must be <= PRICE_UPDATE_INTERVAL_SECS"
            ));
        }
        if self.wiki_timeout_ms == 0 {
            return Err(anyhow!("OSRS_WIKI_TIMEOUT_MS must be > 0"));
        }
        if self.wiki_user_agent.trim().is_empty() {
            return Err(anyhow!("OSRS_WIKI_USER_AGENT must not be empty"));
        }
        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_secs(self.update_interval_secs),
            cycle_timeout: Duration::from_secs(self.cycle_timeout_secs),
        }
    }

    pub fn wiki_config(&self) -> OsrsWikiConfig {
        OsrsWikiConfig {
            base_url: self.wiki_base_url.clone(),
            user_agent: self.wiki_user_agent.clone(),
            request_timeout: Duration::from_millis(self.wiki_timeout_ms),
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        match self.history_max_points_per_item {
            0 => StoreConfig::unbounded(),
            n => StoreConfig {
                max_history_per_item: Some(n),
            },
        }
    }

    pub fn snapshot_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.snapshot_cache_ttl_secs)
    }
}

/// Parse environment variable as u64 with default fallback
fn parse_u64(var_name: &str, default: u64) -> Result<u64> {
    match env::var(var_name) {
        Ok(val) => val.trim().parse().map_err(|_| anyhow!("{} must be a valid u64", var_name)),
        Err(_) => Ok(default),
    }
}

/// First of `var_names` that is set wins; later names are accepted aliases
fn parse_u64_any(var_names: &[&str], default: u64) -> Result<u64> {
    match var_names.iter().find(|name| env::var(name).is_ok()) {
        Some(name) => parse_u64(name, default),
        None => Ok(default),
    }
}

/// Parse environment variable as usize with default fallback
fn parse_usize(var_name: &str, default: usize) -> Result<usize> {
    match env::var(var_name) {
        Ok(val) => val.trim().parse().map_err(|_| anyhow!("{} must be a valid usize", var_name)),
        Err(_) => Ok(default),
    }
}

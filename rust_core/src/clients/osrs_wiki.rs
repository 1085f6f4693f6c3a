//! OSRS Wiki real-time prices API client
//!
//! Reads `/latest` for instant-buy/instant-sell quotes and `/mapping` for
//! item names. The API asks callers to identify themselves with a
//! descriptive User-Agent.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::price_feed::PriceFeed;
use crate::types::{ItemId, NameMapping, PriceSnapshot, SnapshotBatch};

pub const DEFAULT_BASE_URL: &str = "https://prices.runescape.wiki/api/v1/osrs";
pub const DEFAULT_USER_AGENT: &str = "GoodToFlip/1.0 (price tracker)";

#[derive(Debug, Clone)]
pub struct OsrsWikiConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl Default for OsrsWikiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// `/latest` payload
#[derive(Debug, Deserialize)]
struct LatestResponse {
    data: HashMap<String, LatestEntry>,
}

#[derive(Debug, Deserialize)]
struct LatestEntry {
    #[serde(default)]
    high: Option<i64>,
    #[serde(default)]
    low: Option<i64>,
}

/// One element of the `/mapping` array
#[derive(Debug, Deserialize)]
struct MappingEntry {
    id: ItemId,
    name: String,
}

pub struct OsrsWikiClient {
    client: Client,
    base_url: String,
}

impl OsrsWikiClient {
    pub fn new(config: OsrsWikiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch /{} from OSRS wiki", path))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("OSRS wiki API error: {} - {}", status, body));
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse OSRS wiki /{} response", path))
    }
}

#[async_trait]
impl PriceFeed for OsrsWikiClient {
    fn feed_name(&self) -> &str {
        "OsrsWiki"
    }

    async fn fetch_latest(&self) -> Result<SnapshotBatch> {
        let payload: LatestResponse = self.get_json("latest").await?;
        let batch = latest_to_batch(payload);
        debug!("OSRS wiki returned {} quotes", batch.len());
        Ok(batch)
    }

    async fn fetch_names(&self) -> Result<NameMapping> {
        let entries: Vec<MappingEntry> = self.get_json("mapping").await?;
        Ok(entries.into_iter().map(|e| (e.id, e.name)).collect())
    }
}

/// Keys that are not numeric ids are skipped; missing quotes become 0.
fn latest_to_batch(payload: LatestResponse) -> SnapshotBatch {
    payload
        .data
        .into_iter()
        .filter_map(|(key, entry)| {
            let id = key.parse::<ItemId>().ok()?;
            Some((
                id,
                PriceSnapshot::new(entry.high.unwrap_or(0), entry.low.unwrap_or(0)),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_to_batch() {
        let json = r#"{
            "data": {
                "2": {"high": 160, "highTime": 1700000000, "low": 155, "lowTime": 1700000100},
                "4151": {"high": 1500000, "highTime": 1700000000, "low": null, "lowTime": null},
                "6": {"highTime": null, "lowTime": 1700000000, "low": 190000},
                "not-an-id": {"high": 1, "low": 1}
            }
        }"#;

        let payload: LatestResponse = serde_json::from_str(json).unwrap();
        let batch = latest_to_batch(payload);

        assert_eq!(batch.len(), 3);
        assert_eq!(batch[&2], PriceSnapshot::new(160, 155));
        assert_eq!(batch[&4151], PriceSnapshot::new(1_500_000, 0));
        assert_eq!(batch[&6], PriceSnapshot::new(0, 190_000));
        assert!(batch.values().all(|s| s.volume.is_none()));
    }

    #[test]
    fn test_mapping_parse() {
        let json = r#"[
            {"examine": "Fabulously ancient mage protection.", "id": 10344, "members": true, "name": "3rd age amulet", "limit": 8},
            {"id": 2, "name": "Cannonball"}
        ]"#;

        let entries: Vec<MappingEntry> = serde_json::from_str(json).unwrap();
        let names: NameMapping = entries.into_iter().map(|e| (e.id, e.name)).collect();

        assert_eq!(names[&10344], "3rd age amulet");
        assert_eq!(names[&2], "Cannonball");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = OsrsWikiClient::new(OsrsWikiConfig {
            base_url: "http://localhost:9999/api/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:9999/api");
    }

    #[tokio::test]
    #[ignore] // Requires network
    async fn test_fetch_latest_live() {
        let client = OsrsWikiClient::new(OsrsWikiConfig::default()).unwrap();
        match client.fetch_latest().await {
            Ok(batch) => {
                println!("Fetched {} quotes", batch.len());
                assert!(!batch.is_empty());
            }
            Err(e) => println!("Warning: Could not fetch latest prices: {}", e),
        }
    }
}

pub mod cached_feed;
pub mod osrs_wiki;
pub mod price_feed;

// Re-export commonly used types
pub use cached_feed::CachedPriceFeed;
pub use osrs_wiki::{OsrsWikiClient, OsrsWikiConfig};
pub use price_feed::PriceFeed;

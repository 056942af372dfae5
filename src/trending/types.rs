// src/trending/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One trending topic as it flows through aggregation, caching and generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrendingTopic {
    pub id: String,      // "trend-{rank}" after aggregation; adapter-local before
    pub title: String,   // capped to 80 chars
    pub source: String,  // e.g. "Google Trends", "GitHub Trending"
    pub trend_score: u8, // 0..=100, comparable only within one batch
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub tweets: Vec<String>,
    #[serde(default)]
    pub related_links: Vec<String>,
}

impl TrendingTopic {
    /// True when every media slot is already populated by the adapter.
    pub fn has_full_media(&self) -> bool {
        self.image.is_some() && !self.videos.is_empty() && !self.tweets.is_empty()
    }

    pub fn media(&self) -> MediaContent {
        MediaContent {
            image: self.image.clone(),
            videos: self.videos.clone(),
            tweets: self.tweets.clone(),
        }
    }
}

/// Supplementary media resolved for a topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MediaContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub tweets: Vec<String>,
}

/// One external trend source.
///
/// Ordinary failures (HTTP errors, rate limits, empty payloads) are logged by
/// the adapter and surface as `Ok(vec![])`. `Err` is reserved for fatal
/// misconfiguration.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_trending(&self) -> Result<Vec<TrendingTopic>>;
    fn name(&self) -> &'static str;
}

/// Anything that can produce a ranked batch (the aggregator, or a test double).
#[async_trait::async_trait]
pub trait TrendSource: Send + Sync {
    async fn aggregate(&self) -> Vec<TrendingTopic>;
}

// src/store/mod.rs
//! Durable collections used by the pipeline: generated articles, the
//! trending-topic snapshot, and bot run statistics.

pub mod file;
pub mod memory;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bot::BotRunStatistics;
use crate::trending::TrendingTopic;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ArticleMeta {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ArticleMedia {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub tweets: Vec<String>,
}

/// Back-reference from a generated article to the topic that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFrom {
    pub topic: String,
    pub source: String,
    pub trend_score: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: String,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub read_time: u32,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub meta: ArticleMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<ArticleMedia>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_from: Option<GeneratedFrom>,
}

/// Query over the article collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleFilter {
    All,
    Slug(String),
    /// Case-insensitive substring match on the title.
    TitleContains(String),
    GeneratedFromTopic(String),
    HasGeneratedFrom,
    AnyOf(Vec<ArticleFilter>),
}

impl ArticleFilter {
    pub fn matches(&self, a: &Article) -> bool {
        match self {
            ArticleFilter::All => true,
            ArticleFilter::Slug(s) => a.slug == *s,
            ArticleFilter::TitleContains(needle) => a
                .title
                .to_lowercase()
                .contains(needle.to_lowercase().as_str()),
            ArticleFilter::GeneratedFromTopic(t) => {
                a.generated_from.as_ref().is_some_and(|g| g.topic == *t)
            }
            ArticleFilter::HasGeneratedFrom => a.generated_from.is_some(),
            ArticleFilter::AnyOf(fs) => fs.iter().any(|f| f.matches(a)),
        }
    }
}

#[async_trait::async_trait]
pub trait ArticleStore: Send + Sync {
    async fn insert_article(&self, article: Article) -> Result<()>;
    async fn find_article(&self, filter: &ArticleFilter) -> Result<Option<Article>>;
    /// Newest `published_at` first.
    async fn find_articles(&self, filter: &ArticleFilter, limit: usize) -> Result<Vec<Article>>;
    async fn delete_articles(&self, filter: &ArticleFilter) -> Result<usize>;
    async fn count_articles(&self, filter: &ArticleFilter) -> Result<usize>;
}

/// One persisted topic of the latest snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredTopic {
    #[serde(flatten)]
    pub topic: TrendingTopic,
    pub fetched_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait TrendSnapshotStore: Send + Sync {
    /// Delete every stored topic and insert `topics`; all or nothing.
    async fn replace_snapshot(&self, topics: &[TrendingTopic], fetched_at: DateTime<Utc>)
        -> Result<()>;
    /// Most recent first by fetch time, at most `limit`.
    async fn latest_snapshot(&self, limit: usize) -> Result<Vec<TrendingTopic>>;
}

#[async_trait::async_trait]
pub trait BotStatsStore: Send + Sync {
    async fn insert_stats(&self, stats: BotRunStatistics) -> Result<()>;
    async fn latest_stats(&self) -> Result<Option<BotRunStatistics>>;
    /// Delete oldest records until at most `keep` remain. Returns deleted count.
    async fn prune_stats(&self, keep: usize) -> Result<usize>;
}

pub(crate) fn stamp_topics(topics: &[TrendingTopic], fetched_at: DateTime<Utc>) -> Vec<StoredTopic> {
    let now = Utc::now();
    topics
        .iter()
        .cloned()
        .map(|topic| StoredTopic {
            topic,
            fetched_at,
            created_at: now,
        })
        .collect()
}

/// Stable newest-first ordering, so one snapshot keeps its rank order.
pub(crate) fn newest_topics(mut rows: Vec<StoredTopic>, limit: usize) -> Vec<TrendingTopic> {
    rows.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at));
    rows.into_iter().take(limit).map(|r| r.topic).collect()
}

pub(crate) fn newest_articles(
    rows: &[Article],
    filter: &ArticleFilter,
    limit: usize,
) -> Vec<Article> {
    let mut hits: Vec<Article> = rows.iter().filter(|a| filter.matches(a)).cloned().collect();
    hits.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    hits.truncate(limit);
    hits
}

/// Remove the oldest stats rows beyond `keep`; returns how many were removed.
pub(crate) fn prune_oldest(rows: &mut Vec<BotRunStatistics>, keep: usize) -> usize {
    if rows.len() <= keep {
        return 0;
    }
    rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    let excess = rows.len() - keep;
    rows.drain(0..excess);
    excess
}

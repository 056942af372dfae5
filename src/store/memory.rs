// src/store/memory.rs
//! In-process backend. Used by tests and by `storage.backend = "memory"`.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

use crate::bot::BotRunStatistics;
use crate::store::{
    newest_articles, newest_topics, prune_oldest, stamp_topics, Article, ArticleFilter,
    ArticleStore, BotStatsStore, StoredTopic, TrendSnapshotStore,
};
use crate::trending::TrendingTopic;

#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: Mutex<Vec<Article>>,
    topics: Mutex<Vec<StoredTopic>>,
    stats: Mutex<Vec<BotRunStatistics>>,
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    m.lock().map_err(|_| anyhow!("memory store mutex poisoned"))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw snapshot rows, for assertions in tests.
    pub fn snapshot_rows(&self) -> Vec<StoredTopic> {
        self.topics.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn stats_len(&self) -> usize {
        self.stats.lock().map(|g| g.len()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ArticleStore for MemoryStore {
    async fn insert_article(&self, article: Article) -> Result<()> {
        lock(&self.articles)?.push(article);
        Ok(())
    }

    async fn find_article(&self, filter: &ArticleFilter) -> Result<Option<Article>> {
        Ok(lock(&self.articles)?
            .iter()
            .find(|a| filter.matches(a))
            .cloned())
    }

    async fn find_articles(&self, filter: &ArticleFilter, limit: usize) -> Result<Vec<Article>> {
        Ok(newest_articles(&lock(&self.articles)?, filter, limit))
    }

    async fn delete_articles(&self, filter: &ArticleFilter) -> Result<usize> {
        let mut g = lock(&self.articles)?;
        let before = g.len();
        g.retain(|a| !filter.matches(a));
        Ok(before - g.len())
    }

    async fn count_articles(&self, filter: &ArticleFilter) -> Result<usize> {
        Ok(lock(&self.articles)?.iter().filter(|a| filter.matches(a)).count())
    }
}

#[async_trait::async_trait]
impl TrendSnapshotStore for MemoryStore {
    async fn replace_snapshot(
        &self,
        topics: &[TrendingTopic],
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        let rows = stamp_topics(topics, fetched_at);
        *lock(&self.topics)? = rows;
        Ok(())
    }

    async fn latest_snapshot(&self, limit: usize) -> Result<Vec<TrendingTopic>> {
        Ok(newest_topics(lock(&self.topics)?.clone(), limit))
    }
}

#[async_trait::async_trait]
impl BotStatsStore for MemoryStore {
    async fn insert_stats(&self, stats: BotRunStatistics) -> Result<()> {
        lock(&self.stats)?.push(stats);
        Ok(())
    }

    async fn latest_stats(&self) -> Result<Option<BotRunStatistics>> {
        Ok(lock(&self.stats)?
            .iter()
            .max_by_key(|s| s.timestamp)
            .cloned())
    }

    async fn prune_stats(&self, keep: usize) -> Result<usize> {
        let mut g = lock(&self.stats)?;
        Ok(prune_oldest(&mut g, keep))
    }
}

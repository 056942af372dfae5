// src/store/file.rs
//! JSON-file backend: one file per collection under a data directory.
//!
//! Every operation is read-modify-write under a single async mutex, and
//! writes go through a `.json.tmp` file plus rename so a crash never leaves a
//! half-written collection behind.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::bot::BotRunStatistics;
use crate::store::{
    newest_articles, newest_topics, prune_oldest, stamp_topics, Article, ArticleFilter,
    ArticleStore, BotStatsStore, StoredTopic, TrendSnapshotStore,
};
use crate::trending::TrendingTopic;

const ARTICLES_FILE: &str = "articles.json";
const TOPICS_FILE: &str = "trending_topics.json";
const STATS_FILE: &str = "bot_statistics.json";

pub struct JsonFileStore {
    dir: PathBuf,
    io: Mutex<()>,
}

impl JsonFileStore {
    /// Creates the data directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create data dir {}", dir.display()))?;
        tracing::info!(target: "store", dir = %dir.display(), "json file store opened");
        Ok(Self {
            dir,
            io: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

async fn load<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    match tokio::fs::read_to_string(path).await {
        Ok(s) if s.trim().is_empty() => Ok(Vec::new()),
        Ok(s) => serde_json::from_str(&s).with_context(|| format!("parse {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
    }
}

async fn save<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_vec_pretty(rows).context("serialize collection")?;
    tokio::fs::write(&tmp, json)
        .await
        .with_context(|| format!("write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("rename into {}", path.display()))?;
    Ok(())
}

#[async_trait::async_trait]
impl ArticleStore for JsonFileStore {
    async fn insert_article(&self, article: Article) -> Result<()> {
        let _g = self.io.lock().await;
        let path = self.path(ARTICLES_FILE);
        let mut rows: Vec<Article> = load(&path).await?;
        rows.push(article);
        save(&path, &rows).await
    }

    async fn find_article(&self, filter: &ArticleFilter) -> Result<Option<Article>> {
        let _g = self.io.lock().await;
        let rows: Vec<Article> = load(&self.path(ARTICLES_FILE)).await?;
        Ok(rows.into_iter().find(|a| filter.matches(a)))
    }

    async fn find_articles(&self, filter: &ArticleFilter, limit: usize) -> Result<Vec<Article>> {
        let _g = self.io.lock().await;
        let rows: Vec<Article> = load(&self.path(ARTICLES_FILE)).await?;
        Ok(newest_articles(&rows, filter, limit))
    }

    async fn delete_articles(&self, filter: &ArticleFilter) -> Result<usize> {
        let _g = self.io.lock().await;
        let path = self.path(ARTICLES_FILE);
        let mut rows: Vec<Article> = load(&path).await?;
        let before = rows.len();
        rows.retain(|a| !filter.matches(a));
        let removed = before - rows.len();
        if removed > 0 {
            save(&path, &rows).await?;
        }
        Ok(removed)
    }

    async fn count_articles(&self, filter: &ArticleFilter) -> Result<usize> {
        let _g = self.io.lock().await;
        let rows: Vec<Article> = load(&self.path(ARTICLES_FILE)).await?;
        Ok(rows.iter().filter(|a| filter.matches(a)).count())
    }
}

#[async_trait::async_trait]
impl TrendSnapshotStore for JsonFileStore {
    async fn replace_snapshot(
        &self,
        topics: &[TrendingTopic],
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        let _g = self.io.lock().await;
        // Single rename: readers see the old snapshot or the new one, never a mix.
        save(&self.path(TOPICS_FILE), &stamp_topics(topics, fetched_at)).await
    }

    async fn latest_snapshot(&self, limit: usize) -> Result<Vec<TrendingTopic>> {
        let _g = self.io.lock().await;
        let rows: Vec<StoredTopic> = load(&self.path(TOPICS_FILE)).await?;
        Ok(newest_topics(rows, limit))
    }
}

#[async_trait::async_trait]
impl BotStatsStore for JsonFileStore {
    async fn insert_stats(&self, stats: BotRunStatistics) -> Result<()> {
        let _g = self.io.lock().await;
        let path = self.path(STATS_FILE);
        let mut rows: Vec<BotRunStatistics> = load(&path).await?;
        rows.push(stats);
        save(&path, &rows).await
    }

    async fn latest_stats(&self) -> Result<Option<BotRunStatistics>> {
        let _g = self.io.lock().await;
        let rows: Vec<BotRunStatistics> = load(&self.path(STATS_FILE)).await?;
        Ok(rows.into_iter().max_by_key(|s| s.timestamp))
    }

    async fn prune_stats(&self, keep: usize) -> Result<usize> {
        let _g = self.io.lock().await;
        let path = self.path(STATS_FILE);
        let mut rows: Vec<BotRunStatistics> = load(&path).await?;
        let removed = prune_oldest(&mut rows, keep);
        if removed > 0 {
            save(&path, &rows).await?;
        }
        Ok(removed)
    }
}

// src/trending/aggregator.rs
//! Fan-out/fan-in over all source adapters.
//!
//! Every adapter runs concurrently and is awaited to completion; a failing or
//! empty adapter contributes nothing. The merged list is stable-sorted by
//! score, truncated, and re-ranked as `trend-{n}`.

use futures::future::join_all;
use std::sync::Arc;

use crate::media::MediaEnricher;
use crate::trending::types::{SourceProvider, TrendSource, TrendingTopic};
use crate::trending::{ensure_metrics_described, MAX_TOPICS_PER_SOURCE};

/// Maximum topics in an aggregated batch.
pub const DEFAULT_AGGREGATE_LIMIT: usize = 15;

pub struct Aggregator {
    providers: Vec<Arc<dyn SourceProvider>>,
    enricher: Option<Arc<MediaEnricher>>,
    limit: usize,
}

impl Aggregator {
    pub fn new(providers: Vec<Arc<dyn SourceProvider>>) -> Self {
        Self {
            providers,
            enricher: None,
            limit: DEFAULT_AGGREGATE_LIMIT,
        }
    }

    /// Fill missing media on the final batch.
    pub fn with_enricher(mut self, enricher: Arc<MediaEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn aggregate(&self) -> Vec<TrendingTopic> {
        ensure_metrics_described();

        let settled = join_all(self.providers.iter().map(|p| async move {
            match p.fetch_trending().await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(target: "trending", provider = p.name(), error = ?e, "provider fatal error");
                    Vec::new()
                }
            }
        }))
        .await;

        let merged: Vec<TrendingTopic> = settled
            .into_iter()
            .flat_map(|batch| batch.into_iter().take(MAX_TOPICS_PER_SOURCE))
            .collect();
        let mut ranked = rank_topics(merged, self.limit);

        if let Some(enricher) = &self.enricher {
            enrich_missing(enricher, &mut ranked).await;
        }

        tracing::info!(target: "trending", count = ranked.len(), "aggregation finished");
        ranked
    }
}

#[async_trait::async_trait]
impl TrendSource for Aggregator {
    async fn aggregate(&self) -> Vec<TrendingTopic> {
        Aggregator::aggregate(self).await
    }
}

/// Stable sort by score descending (ties keep arrival order), truncate,
/// and reassign ids by 1-based rank.
pub fn rank_topics(mut topics: Vec<TrendingTopic>, limit: usize) -> Vec<TrendingTopic> {
    topics.sort_by(|a, b| b.trend_score.cmp(&a.trend_score));
    topics.truncate(limit);
    for (i, t) in topics.iter_mut().enumerate() {
        t.id = format!("trend-{}", i + 1);
    }
    topics
}

async fn enrich_missing(enricher: &MediaEnricher, topics: &mut [TrendingTopic]) {
    let lookups = topics.iter().map(|t| async move {
        if t.has_full_media() {
            None
        } else {
            Some(enricher.resolve(&t.title).await)
        }
    });
    let resolved = join_all(lookups).await;

    for (t, media) in topics.iter_mut().zip(resolved) {
        let Some(m) = media else { continue };
        if t.image.is_none() {
            t.image = m.image;
        }
        if t.videos.is_empty() {
            t.videos = m.videos;
        }
        if t.tweets.is_empty() {
            t.tweets = m.tweets;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(title: &str, score: u8) -> TrendingTopic {
        TrendingTopic {
            title: title.into(),
            trend_score: score,
            ..Default::default()
        }
    }

    #[test]
    fn ties_keep_arrival_order() {
        let out = rank_topics(
            vec![scored("a", 80), scored("b", 90), scored("c", 80)],
            15,
        );
        let titles: Vec<_> = out.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a", "c"]);
        assert_eq!(out[2].id, "trend-3");
    }

    #[test]
    fn truncates_to_limit() {
        let many = (0..40).map(|i| scored(&i.to_string(), (i % 100) as u8)).collect();
        let out = rank_topics(many, 15);
        assert_eq!(out.len(), 15);
        assert_eq!(out[0].trend_score, 39);
    }
}

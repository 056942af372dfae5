// src/trending/cache.rs
//! TTL cache for aggregated batches and the read gateway in front of it.
//!
//! Read path: fresh cache → live aggregation (persisted as the new durable
//! snapshot) → durable snapshot → built-in list. Snapshot and built-in
//! batches are served but never cached as fresh.

use chrono::Utc;
use metrics::counter;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::store::TrendSnapshotStore;
use crate::trending::aggregator::DEFAULT_AGGREGATE_LIMIT;
use crate::trending::fallback::builtin_topics;
use crate::trending::types::{TrendSource, TrendingTopic};

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
}

/// Where a served batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOrigin {
    Cache,
    Live,
    Snapshot,
    Builtin,
}

impl BatchOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchOrigin::Cache => "cache",
            BatchOrigin::Live => "live",
            BatchOrigin::Snapshot => "snapshot",
            BatchOrigin::Builtin => "builtin",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrendBatch {
    pub topics: Vec<TrendingTopic>,
    pub origin: BatchOrigin,
}

struct CachedBatch {
    topics: Arc<Vec<TrendingTopic>>,
    stored_at: Instant,
}

/// Copy-on-write batch slot: a refresh swaps in a new `Arc`, readers keep
/// whatever batch they already cloned.
pub struct TrendCache {
    ttl: Duration,
    slot: RwLock<Option<CachedBatch>>,
}

impl TrendCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn state(&self) -> CacheState {
        let g = self.slot.read().unwrap_or_else(|e| e.into_inner());
        match g.as_ref() {
            None => CacheState::Empty,
            Some(b) if b.stored_at.elapsed() < self.ttl => CacheState::Fresh,
            Some(_) => CacheState::Stale,
        }
    }

    /// The cached batch, only while it is younger than the TTL.
    pub fn fresh(&self) -> Option<Arc<Vec<TrendingTopic>>> {
        let g = self.slot.read().unwrap_or_else(|e| e.into_inner());
        g.as_ref()
            .filter(|b| b.stored_at.elapsed() < self.ttl)
            .map(|b| Arc::clone(&b.topics))
    }

    pub fn store(&self, topics: Vec<TrendingTopic>) {
        let mut g = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *g = Some(CachedBatch {
            topics: Arc::new(topics),
            stored_at: Instant::now(),
        });
    }

    pub fn invalidate(&self) {
        let mut g = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *g = None;
    }
}

pub struct TrendGateway {
    source: Arc<dyn TrendSource>,
    snapshots: Arc<dyn TrendSnapshotStore>,
    cache: TrendCache,
    // Serializes refreshes so concurrent misses trigger one aggregation.
    refresh_gate: Mutex<()>,
    snapshot_limit: usize,
}

impl TrendGateway {
    pub fn new(
        source: Arc<dyn TrendSource>,
        snapshots: Arc<dyn TrendSnapshotStore>,
        ttl: Duration,
    ) -> Self {
        Self {
            source,
            snapshots,
            cache: TrendCache::new(ttl),
            refresh_gate: Mutex::new(()),
            snapshot_limit: DEFAULT_AGGREGATE_LIMIT,
        }
    }

    pub fn cache(&self) -> &TrendCache {
        &self.cache
    }

    pub async fn get_trending(&self) -> TrendBatch {
        if let Some(hit) = self.cache.fresh() {
            counter!("trend_cache_hits_total").increment(1);
            return TrendBatch {
                topics: hit.as_ref().clone(),
                origin: BatchOrigin::Cache,
            };
        }
        counter!("trend_cache_misses_total").increment(1);

        let _gate = self.refresh_gate.lock().await;
        // Another reader may have refreshed while we waited on the gate.
        if let Some(hit) = self.cache.fresh() {
            return TrendBatch {
                topics: hit.as_ref().clone(),
                origin: BatchOrigin::Cache,
            };
        }
        self.refresh_locked().await
    }

    /// Drop the cached batch and run the read path unconditionally.
    pub async fn force_refresh(&self) -> TrendBatch {
        let _gate = self.refresh_gate.lock().await;
        self.cache.invalidate();
        tracing::info!(target: "trending", "forced refresh");
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> TrendBatch {
        let topics = self.source.aggregate().await;
        if topics.is_empty() {
            return self.fallback().await;
        }

        self.cache.store(topics.clone());
        if let Err(e) = self.snapshots.replace_snapshot(&topics, Utc::now()).await {
            tracing::warn!(target: "store", error = ?e, "snapshot persist failed; serving live batch anyway");
        }
        tracing::info!(target: "trending", count = topics.len(), "cache refreshed");
        TrendBatch {
            topics,
            origin: BatchOrigin::Live,
        }
    }

    async fn fallback(&self) -> TrendBatch {
        match self.snapshots.latest_snapshot(self.snapshot_limit).await {
            Ok(topics) if !topics.is_empty() => {
                tracing::warn!(target: "trending", count = topics.len(), "aggregation empty; serving durable snapshot");
                counter!("trend_fallback_total", "origin" => "snapshot").increment(1);
                return TrendBatch {
                    topics,
                    origin: BatchOrigin::Snapshot,
                };
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(target: "store", error = ?e, "snapshot read failed");
            }
        }

        tracing::warn!(target: "trending", "no live batch and no snapshot; serving built-in topics");
        counter!("trend_fallback_total", "origin" => "builtin").increment(1);
        TrendBatch {
            topics: builtin_topics(),
            origin: BatchOrigin::Builtin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cache_moves_empty_fresh_stale() {
        let cache = TrendCache::new(Duration::from_secs(10));
        assert_eq!(cache.state(), CacheState::Empty);

        cache.store(vec![TrendingTopic::default()]);
        assert_eq!(cache.state(), CacheState::Fresh);
        assert!(cache.fresh().is_some());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.state(), CacheState::Stale);
        assert!(cache.fresh().is_none());

        cache.invalidate();
        assert_eq!(cache.state(), CacheState::Empty);
    }
}

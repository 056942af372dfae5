// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod bot;
pub mod config;
pub mod generator;
pub mod media;
pub mod metrics;
pub mod store;
pub mod trending;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

pub use crate::api::{create_router, AppState};

use crate::bot::BackendBot;
use crate::config::{AppConfig, StorageBackend};
use crate::generator::{ArticleGenerator, DisabledGenerator, HttpArticleGenerator};
use crate::media::MediaEnricher;
use crate::store::{
    file::JsonFileStore, memory::MemoryStore, ArticleStore, BotStatsStore, TrendSnapshotStore,
};
use crate::trending::aggregator::Aggregator;
use crate::trending::cache::TrendGateway;
use crate::trending::providers::build_providers;
use crate::trending::TrendSource;

/// The three collections, usually backed by one store.
#[derive(Clone)]
pub struct Stores {
    pub articles: Arc<dyn ArticleStore>,
    pub snapshots: Arc<dyn TrendSnapshotStore>,
    pub stats: Arc<dyn BotStatsStore>,
}

impl Stores {
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: ArticleStore + TrendSnapshotStore + BotStatsStore + 'static,
    {
        Self {
            articles: store.clone(),
            snapshots: store.clone(),
            stats: store,
        }
    }

    pub async fn from_config(cfg: &AppConfig) -> Result<Self> {
        Ok(match cfg.storage.backend {
            StorageBackend::File => Self::shared(Arc::new(
                JsonFileStore::open(&cfg.storage.data_dir).await?,
            )),
            StorageBackend::Memory => {
                tracing::warn!(target: "store", "memory storage: nothing survives a restart");
                Self::shared(Arc::new(MemoryStore::new()))
            }
        })
    }
}

/// Wire gateway and bot around one trend source and a set of stores.
pub fn assemble(
    source: Arc<dyn TrendSource>,
    generator: Arc<dyn ArticleGenerator>,
    stores: Stores,
    cfg: &AppConfig,
) -> AppState {
    let gateway = Arc::new(TrendGateway::new(
        Arc::clone(&source),
        stores.snapshots,
        cfg.trending.cache_ttl(),
    ));
    let bot = Arc::new(
        BackendBot::new(
            source,
            generator,
            stores.articles,
            stores.stats,
            cfg.bot.auto_generation(),
        )
        .with_generation_delay(cfg.bot.generation_delay()),
    );
    AppState { gateway, bot }
}

/// Build the live application state from configuration.
pub async fn build_state(cfg: &AppConfig) -> Result<AppState> {
    let providers = build_providers(&cfg.trending, cfg.trending.github_token())
        .context("building source adapters")?;
    let mut aggregator = Aggregator::new(providers).with_limit(cfg.trending.limit);
    if cfg.trending.enrich_media {
        let enricher = MediaEnricher::from_keys(&cfg.media.keys(), cfg.trending.http_timeout())
            .context("building media enricher")?;
        aggregator = aggregator.with_enricher(Arc::new(enricher));
    }

    let generator: Arc<dyn ArticleGenerator> = match &cfg.generator.endpoint {
        Some(url) => Arc::new(HttpArticleGenerator::new(
            url.as_str(),
            Duration::from_secs(cfg.generator.timeout_secs),
        )?),
        None => {
            tracing::warn!(target: "bot", "no article generator endpoint configured; generation disabled");
            Arc::new(DisabledGenerator)
        }
    };

    let stores = Stores::from_config(cfg).await?;
    Ok(assemble(Arc::new(aggregator), generator, stores, cfg))
}

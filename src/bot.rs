// src/bot.rs
//! Automated article-generation bot.
//!
//! One cycle: aggregate fresh topics, keep the high scorers, drop topics that
//! already have an article, generate the rest one at a time with a delay in
//! between, then record run statistics. Cycles never overlap: the phase check
//! and set happen synchronously before the first await.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::generator::{ArticleGenerator, GeneratedArticle, GenerationRequest};
use crate::store::{
    Article, ArticleFilter, ArticleMedia, ArticleMeta, ArticleStore, BotStatsStore, GeneratedFrom,
};
use crate::trending::{ensure_metrics_described, normalize_text, slugify, TrendSource, TrendingTopic};

/// Persisted statistics beyond this many records are pruned, oldest first.
pub const STATS_RETENTION: usize = 100;
pub const DEFAULT_GENERATION_DELAY: Duration = Duration::from_millis(2_000);
pub const GENERATED_ARTICLE_AUTHOR: &str = "AI Assistant";
/// Shortest recurring interval; `cooldown_hours = 0` lands here.
pub const MIN_CYCLE_INTERVAL: Duration = Duration::from_secs(60);
const DEDUP_TITLE_PREFIX_CHARS: usize = 20;
const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoGenerationConfig {
    pub max_articles_per_run: usize,
    pub min_trend_score: u8,
    pub cooldown_hours: u64,
    pub enabled: bool,
}

impl Default for AutoGenerationConfig {
    fn default() -> Self {
        Self {
            max_articles_per_run: 3,
            min_trend_score: 80,
            cooldown_hours: 6,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BotRunStatistics {
    pub timestamp: DateTime<Utc>,
    pub topics_processed: usize,
    pub high_score_topics: usize,
    pub articles_generated: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BotPhase {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotEvent {
    TimerFired,
    ManualTrigger,
    CycleCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    StartCycle,
    /// Cycle requested while one is running; dropped, not queued.
    Skip,
    None,
}

impl BotPhase {
    pub fn on(self, event: BotEvent) -> (BotPhase, BotAction) {
        match (self, event) {
            (BotPhase::Idle, BotEvent::TimerFired | BotEvent::ManualTrigger) => {
                (BotPhase::Running, BotAction::StartCycle)
            }
            (BotPhase::Running, BotEvent::TimerFired | BotEvent::ManualTrigger) => {
                (BotPhase::Running, BotAction::Skip)
            }
            (_, BotEvent::CycleCompleted) => (BotPhase::Idle, BotAction::None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was running.
    Skipped,
    /// Aggregation returned nothing; no statistics recorded.
    NoTopics,
    Completed(BotRunStatistics),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BotStatus {
    pub last_run: Option<DateTime<Utc>>,
    pub is_running: bool,
    pub total_generated_articles: usize,
    pub last_cycle_stats: Option<BotRunStatistics>,
    pub config: AutoGenerationConfig,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Returns the phase to idle when a cycle ends, including on panic.
struct CycleGuard<'a> {
    phase: &'a Mutex<BotPhase>,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        let mut p = lock(self.phase);
        *p = p.on(BotEvent::CycleCompleted).0;
    }
}

pub struct BackendBot {
    source: Arc<dyn TrendSource>,
    generator: Arc<dyn ArticleGenerator>,
    articles: Arc<dyn ArticleStore>,
    stats: Arc<dyn BotStatsStore>,
    config: AutoGenerationConfig,
    enabled: AtomicBool,
    phase: Mutex<BotPhase>,
    last_run: Mutex<Option<DateTime<Utc>>>,
    // Bumped by every `start`; a timer task whose epoch is stale exits.
    timer_epoch: AtomicU64,
    generation_delay: Duration,
    cycle_interval: Duration,
}

impl BackendBot {
    pub fn new(
        source: Arc<dyn TrendSource>,
        generator: Arc<dyn ArticleGenerator>,
        articles: Arc<dyn ArticleStore>,
        stats: Arc<dyn BotStatsStore>,
        config: AutoGenerationConfig,
    ) -> Self {
        let cycle_interval =
            floor_interval(Duration::from_secs(config.cooldown_hours.saturating_mul(3600)));
        Self {
            source,
            generator,
            articles,
            stats,
            enabled: AtomicBool::new(config.enabled),
            config,
            phase: Mutex::new(BotPhase::Idle),
            last_run: Mutex::new(None),
            timer_epoch: AtomicU64::new(0),
            generation_delay: DEFAULT_GENERATION_DELAY,
            cycle_interval,
        }
    }

    pub fn with_generation_delay(mut self, delay: Duration) -> Self {
        self.generation_delay = delay;
        self
    }

    /// Override the recurring interval derived from `cooldown_hours`.
    /// Never shorter than [`MIN_CYCLE_INTERVAL`].
    pub fn with_cycle_interval(mut self, interval: Duration) -> Self {
        self.cycle_interval = floor_interval(interval);
        self
    }

    pub fn cycle_interval(&self) -> Duration {
        self.cycle_interval
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        *lock(&self.phase) == BotPhase::Running
    }

    pub fn config(&self) -> AutoGenerationConfig {
        AutoGenerationConfig {
            enabled: self.is_enabled(),
            ..self.config.clone()
        }
    }

    /// Enable the bot, run one cycle now, and schedule the next one a full
    /// interval after it. A timer left over from an earlier `start` retires
    /// on its next tick.
    pub async fn start(self: &Arc<Self>) -> CycleOutcome {
        self.enabled.store(true, Ordering::SeqCst);
        let epoch = self.timer_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(target: "bot", interval_secs = self.cycle_interval.as_secs(), "bot starting");
        let outcome = self.run_cycle(BotEvent::TimerFired).await;
        self.spawn_timer(epoch);
        outcome
    }

    pub async fn manual_trigger(&self) -> CycleOutcome {
        tracing::info!(target: "bot", "manual trigger requested");
        self.run_cycle(BotEvent::ManualTrigger).await
    }

    /// Prevent future scheduled cycles. An in-flight cycle runs to completion.
    pub fn stop(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        tracing::info!(target: "bot", "bot stopped");
    }

    fn spawn_timer(self: &Arc<Self>, epoch: u64) {
        let period = self.cycle_interval;
        let bot = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(bot) = bot.upgrade() else { break };
                if bot.timer_epoch.load(Ordering::SeqCst) != epoch {
                    tracing::debug!(target: "bot", epoch, "timer superseded by a later start");
                    break;
                }
                if !bot.is_enabled() {
                    tracing::info!(target: "bot", "bot disabled; timer exiting");
                    break;
                }
                bot.run_cycle(BotEvent::TimerFired).await;
            }
        });
    }

    fn try_begin(&self, event: BotEvent) -> Option<CycleGuard<'_>> {
        let mut p = lock(&self.phase);
        let (next, action) = p.on(event);
        *p = next;
        match action {
            BotAction::StartCycle => Some(CycleGuard { phase: &self.phase }),
            BotAction::Skip | BotAction::None => None,
        }
    }

    pub async fn run_cycle(&self, event: BotEvent) -> CycleOutcome {
        ensure_metrics_described();
        let Some(_guard) = self.try_begin(event) else {
            counter!("bot_cycles_skipped_total").increment(1);
            tracing::info!(target: "bot", ?event, "cycle already running; request ignored");
            return CycleOutcome::Skipped;
        };
        counter!("bot_cycles_total").increment(1);
        tracing::info!(target: "bot", ?event, "generation cycle started");

        let topics = self.source.aggregate().await;
        if topics.is_empty() {
            tracing::info!(target: "bot", "no trending topics; cycle aborted");
            return CycleOutcome::NoTopics;
        }

        let high: Vec<&TrendingTopic> = topics
            .iter()
            .filter(|t| t.trend_score >= self.config.min_trend_score)
            .collect();
        let high_score_topics = high.len();
        let selected: Vec<&TrendingTopic> =
            high.into_iter().take(self.config.max_articles_per_run).collect();
        let fresh = self.filter_existing(selected).await;
        tracing::info!(
            target: "bot",
            fetched = topics.len(),
            high_score = high_score_topics,
            new = fresh.len(),
            "candidates selected"
        );

        let mut generated = 0usize;
        for (i, topic) in fresh.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.generation_delay).await;
            }
            match self.generate_one(topic).await {
                Ok(article) => {
                    generated += 1;
                    counter!("bot_articles_generated_total").increment(1);
                    tracing::info!(target: "bot", topic = %topic.title, slug = %article.slug, "article generated");
                }
                Err(e) => {
                    counter!("bot_generation_failures_total").increment(1);
                    tracing::warn!(target: "bot", topic = %topic.title, error = ?e, "generation failed; continuing");
                }
            }
        }

        let stats = BotRunStatistics {
            timestamp: Utc::now(),
            topics_processed: topics.len(),
            high_score_topics,
            articles_generated: generated,
        };
        self.record(&stats).await;
        *lock(&self.last_run) = Some(stats.timestamp);
        tracing::info!(target: "bot", generated, "generation cycle completed");
        CycleOutcome::Completed(stats)
    }

    async fn filter_existing<'t>(&self, topics: Vec<&'t TrendingTopic>) -> Vec<&'t TrendingTopic> {
        let mut keep = Vec::with_capacity(topics.len());
        for t in topics {
            match self.articles.find_article(&dedup_filter(&t.title)).await {
                Ok(Some(existing)) => {
                    tracing::debug!(target: "bot", topic = %t.title, existing = %existing.slug, "article exists; skipping");
                }
                Ok(None) => keep.push(t),
                Err(e) => {
                    tracing::warn!(target: "store", topic = %t.title, error = ?e, "dedup lookup failed; keeping candidate");
                    keep.push(t);
                }
            }
        }
        keep
    }

    async fn generate_one(&self, topic: &TrendingTopic) -> Result<Article> {
        let resp = self
            .generator
            .generate(&GenerationRequest::from(topic))
            .await
            .with_context(|| format!("generator {} call", self.generator.name()))?;
        let generated = resp.into_article()?;
        let article = build_article(generated, topic, Utc::now());
        self.articles
            .insert_article(article.clone())
            .await
            .context("persist generated article")?;
        Ok(article)
    }

    async fn record(&self, stats: &BotRunStatistics) {
        if let Err(e) = self.stats.insert_stats(stats.clone()).await {
            tracing::warn!(target: "store", error = ?e, "bot statistics insert failed");
            return;
        }
        match self.stats.prune_stats(STATS_RETENTION).await {
            Ok(0) => {}
            Ok(n) => tracing::debug!(target: "store", pruned = n, "old bot statistics pruned"),
            Err(e) => tracing::warn!(target: "store", error = ?e, "bot statistics prune failed"),
        }
    }

    /// Read-only snapshot; storage errors degrade to empty values.
    pub async fn get_statistics(&self) -> BotStatus {
        let last_cycle_stats = match self.stats.latest_stats().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(target: "store", error = ?e, "latest bot statistics read failed");
                None
            }
        };
        let total_generated_articles = match self
            .articles
            .count_articles(&ArticleFilter::HasGeneratedFrom)
            .await
        {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(target: "store", error = ?e, "generated article count failed");
                0
            }
        };
        let last_run = last_cycle_stats
            .as_ref()
            .map(|s| s.timestamp)
            .or(*lock(&self.last_run));

        BotStatus {
            last_run,
            is_running: self.is_running(),
            total_generated_articles,
            last_cycle_stats,
            config: self.config(),
        }
    }
}

fn floor_interval(interval: Duration) -> Duration {
    if interval < MIN_CYCLE_INTERVAL {
        tracing::warn!(
            target: "bot",
            requested_ms = interval.as_millis() as u64,
            "cycle interval below the minimum; using 60s"
        );
        MIN_CYCLE_INTERVAL
    } else {
        interval
    }
}

/// Matches an existing article by slug, by the first 20 title characters
/// (case-insensitive), or by a back-reference to the same topic.
pub fn dedup_filter(title: &str) -> ArticleFilter {
    let mut any = vec![ArticleFilter::Slug(slugify(title))];
    let prefix: String = title.chars().take(DEDUP_TITLE_PREFIX_CHARS).collect();
    if !prefix.trim().is_empty() {
        any.push(ArticleFilter::TitleContains(prefix));
    }
    any.push(ArticleFilter::GeneratedFromTopic(title.to_string()));
    ArticleFilter::AnyOf(any)
}

/// Minutes at 200 words per minute, tags stripped, at least 1.
pub fn read_time_minutes(content: &str) -> u32 {
    let words = normalize_text(content).split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

pub fn build_article(g: GeneratedArticle, topic: &TrendingTopic, now: DateTime<Utc>) -> Article {
    let slug = match slugify(&g.title) {
        s if s.is_empty() => slugify(&topic.title),
        s => s,
    };
    let media = topic.media();
    let media = (media.image.is_some() || !media.videos.is_empty() || !media.tweets.is_empty())
        .then(|| ArticleMedia {
            images: media.image.into_iter().collect(),
            videos: media.videos,
            tweets: media.tweets,
        });

    Article {
        read_time: read_time_minutes(&g.content),
        meta: ArticleMeta {
            title: g.meta_title.unwrap_or_else(|| g.title.clone()),
            description: g.meta_description.unwrap_or_else(|| g.excerpt.clone()),
            keywords: g.tags.clone(),
        },
        title: g.title,
        slug,
        excerpt: g.excerpt,
        content: g.content,
        author: GENERATED_ARTICLE_AUTHOR.to_string(),
        tags: g.tags,
        category: if g.category.is_empty() {
            topic.category.clone()
        } else {
            g.category
        },
        published_at: now,
        updated_at: now,
        views: 0,
        featured: false,
        media,
        generated_from: Some(GeneratedFrom {
            topic: topic.title.clone(),
            source: topic.source.clone(),
            trend_score: topic.trend_score,
        }),
    }
}

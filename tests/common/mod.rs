// tests/common/mod.rs
//
// Hand-written doubles for the public traits, shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use trendwise::generator::{ArticleGenerator, GeneratedArticle, GenerationRequest, GenerationResponse};
use trendwise::store::TrendSnapshotStore;
use trendwise::trending::{SourceProvider, TrendSource, TrendingTopic};

pub fn topic(title: &str, score: u8) -> TrendingTopic {
    TrendingTopic {
        id: format!("t-{title}"),
        title: title.to_string(),
        source: "Test".to_string(),
        trend_score: score,
        category: "Technology".to_string(),
        description: format!("about {title}"),
        keywords: vec![title.to_lowercase()],
        ..Default::default()
    }
}

/// Adapter returning a fixed list.
pub struct FixedProvider {
    pub name: &'static str,
    pub topics: Vec<TrendingTopic>,
}

impl FixedProvider {
    pub fn scores(name: &'static str, scores: &[u8]) -> Arc<dyn SourceProvider> {
        Arc::new(Self {
            name,
            topics: scores
                .iter()
                .map(|s| topic(&format!("{name} {s}"), *s))
                .collect(),
        })
    }
}

#[async_trait::async_trait]
impl SourceProvider for FixedProvider {
    async fn fetch_trending(&self) -> Result<Vec<TrendingTopic>> {
        Ok(self.topics.clone())
    }
    fn name(&self) -> &'static str {
        self.name
    }
}

/// Adapter whose client is "misconfigured": always a fatal error.
pub struct BrokenProvider;

#[async_trait::async_trait]
impl SourceProvider for BrokenProvider {
    async fn fetch_trending(&self) -> Result<Vec<TrendingTopic>> {
        Err(anyhow!("client misconfigured"))
    }
    fn name(&self) -> &'static str {
        "broken"
    }
}

/// Trend source that replays queued batches (last one repeats) and counts calls.
pub struct ScriptedSource {
    batches: Mutex<VecDeque<Vec<TrendingTopic>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(batches: Vec<Vec<TrendingTopic>>) -> Arc<Self> {
        Arc::new(Self {
            batches: Mutex::new(batches.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn fixed(batch: Vec<TrendingTopic>) -> Arc<Self> {
        Self::new(vec![batch])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TrendSource for ScriptedSource {
    async fn aggregate(&self) -> Vec<TrendingTopic> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut q = self.batches.lock().unwrap();
        if q.len() > 1 {
            q.pop_front().unwrap_or_default()
        } else {
            q.front().cloned().unwrap_or_default()
        }
    }
}

/// Generator that records every topic it is asked for.
pub struct RecordingGenerator {
    pub calls: Mutex<Vec<String>>,
    pub delay: Duration,
    pub fail_for: Vec<String>,
}

impl RecordingGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            fail_for: Vec::new(),
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            delay,
            fail_for: Vec::new(),
        })
    }

    pub fn failing_for(titles: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            fail_for: titles.iter().map(|t| t.to_string()).collect(),
        })
    }

    pub fn topics(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ArticleGenerator for RecordingGenerator {
    async fn generate(&self, req: &GenerationRequest) -> Result<GenerationResponse> {
        self.calls.lock().unwrap().push(req.topic.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_for.contains(&req.topic) {
            return Err(anyhow!("upstream 503 for {}", req.topic));
        }
        Ok(GenerationResponse {
            success: true,
            article: Some(GeneratedArticle {
                title: format!("Deep Dive: {}", req.topic),
                excerpt: format!("What {} means for developers", req.topic),
                content: format!("<h1>{}</h1><p>{}</p>", req.topic, "word ".repeat(450)),
                tags: req.keywords.clone(),
                category: "Technology".into(),
                meta_title: None,
                meta_description: None,
            }),
            error: None,
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Snapshot store whose writes and reads always fail.
pub struct FailingSnapshots;

#[async_trait::async_trait]
impl TrendSnapshotStore for FailingSnapshots {
    async fn replace_snapshot(&self, _: &[TrendingTopic], _: DateTime<Utc>) -> Result<()> {
        Err(anyhow!("disk full"))
    }
    async fn latest_snapshot(&self, _: usize) -> Result<Vec<TrendingTopic>> {
        Err(anyhow!("disk gone"))
    }
}

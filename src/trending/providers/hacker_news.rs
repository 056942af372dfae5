// src/trending/providers/hacker_news.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::time::Instant;

use crate::trending::providers::{get_text, settle};
use crate::trending::types::{SourceProvider, TrendingTopic};
use crate::trending::{
    cap_title, clamp_score, extract_keywords, normalize_text, MAX_TOPICS_PER_SOURCE,
};

const NAME: &str = "Hacker News";
const API_BASE: &str = "https://hacker-news.firebaseio.com/v0";
/// Item bodies fetched in parallel, order preserved.
const ITEM_CONCURRENCY: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct HnItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub score: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
}

/// `min(100, points / 10)`.
pub fn points_score(points: u64) -> u8 {
    clamp_score((points / 10).min(100) as i64)
}

pub struct HackerNewsProvider {
    mode: Mode,
}

enum Mode {
    /// JSON array of already-resolved item bodies.
    Fixture(String),
    Http { client: reqwest::Client },
}

impl HackerNewsProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http { client },
        }
    }

    pub fn from_fixture(items_json: &str) -> Self {
        Self {
            mode: Mode::Fixture(items_json.to_string()),
        }
    }

    pub fn topics_from_items(items: Vec<HnItem>) -> Vec<TrendingTopic> {
        let mut out = Vec::with_capacity(MAX_TOPICS_PER_SOURCE);
        for item in items {
            let title = normalize_text(item.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                continue;
            }
            out.push(TrendingTopic {
                id: format!("hn-{}", out.len() + 1),
                title: cap_title(&title),
                source: NAME.to_string(),
                trend_score: points_score(item.score.unwrap_or(0)),
                category: "Technology".to_string(),
                description: title.clone(),
                keywords: extract_keywords(&title),
                image: None,
                videos: Vec::new(),
                tweets: Vec::new(),
                related_links: item.url.into_iter().collect(),
            });
            if out.len() == MAX_TOPICS_PER_SOURCE {
                break;
            }
        }
        out
    }

    async fn fetch_live(client: &reqwest::Client) -> Result<Vec<TrendingTopic>> {
        let body = get_text(
            client.get(format!("{API_BASE}/topstories.json")),
            "hn topstories",
        )
        .await?;
        let ids: Vec<u64> = serde_json::from_str(&body).context("parsing hn topstories")?;

        let items: Vec<HnItem> = stream::iter(ids.into_iter().take(MAX_TOPICS_PER_SOURCE))
            .map(|id| async move {
                let url = format!("{API_BASE}/item/{id}.json");
                match get_text(client.get(url), "hn item").await {
                    Ok(b) => match serde_json::from_str::<Option<HnItem>>(&b) {
                        Ok(item) => item,
                        Err(e) => {
                            tracing::warn!(target: "trending", id, error = ?e, "hn item parse failed");
                            None
                        }
                    },
                    Err(e) => {
                        tracing::warn!(target: "trending", id, error = ?e, "hn item fetch failed");
                        None
                    }
                }
            })
            .buffered(ITEM_CONCURRENCY)
            .filter_map(|opt| std::future::ready(opt))
            .collect()
            .await;

        Ok(Self::topics_from_items(items))
    }
}

#[async_trait]
impl SourceProvider for HackerNewsProvider {
    async fn fetch_trending(&self) -> Result<Vec<TrendingTopic>> {
        let t0 = Instant::now();
        let res = match &self.mode {
            Mode::Fixture(s) => serde_json::from_str::<Vec<HnItem>>(s)
                .context("parsing hn items fixture")
                .map(Self::topics_from_items),
            Mode::Http { client } => Self::fetch_live(client).await,
        };
        Ok(settle(NAME, t0, res))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

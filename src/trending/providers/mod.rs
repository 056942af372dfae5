// src/trending/providers/mod.rs
//! Source adapters. Each adapter has a live HTTP mode and a fixture mode that
//! feeds a captured response body through the same parse function.

pub mod dev_to;
pub mod github;
pub mod google_trends_daily;
pub mod google_trends_rss;
pub mod hacker_news;

use anyhow::{Context, Result};
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{GoogleTrendsMode, SourceKind, TrendingConfig};
use crate::trending::types::{SourceProvider, TrendingTopic};
use crate::trending::MAX_TOPICS_PER_SOURCE;

pub const USER_AGENT: &str = "TrendWise-Bot/0.1 (+https://github.com/trendwise/trendwise)";

/// Shared HTTP client for adapters. Failing to build one is the only fatal
/// adapter condition.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(4))
        .timeout(timeout)
        .build()
        .context("building adapter http client")
}

/// Turn an adapter run into its settled batch: errors become an empty batch
/// (logged + counted), successes are capped and counted.
pub(crate) fn settle(
    provider: &'static str,
    started: Instant,
    res: Result<Vec<TrendingTopic>>,
) -> Vec<TrendingTopic> {
    let ms = started.elapsed().as_secs_f64() * 1_000.0;
    histogram!("trending_fetch_ms", "provider" => provider).record(ms);
    match res {
        Ok(mut topics) => {
            topics.truncate(MAX_TOPICS_PER_SOURCE);
            if topics.is_empty() {
                tracing::warn!(target: "trending", provider, "provider returned no topics");
            } else {
                tracing::debug!(target: "trending", provider, count = topics.len(), "provider ok");
            }
            counter!("trending_topics_fetched_total", "provider" => provider)
                .increment(topics.len() as u64);
            topics
        }
        Err(e) => {
            tracing::warn!(target: "trending", provider, error = ?e, "provider failed");
            counter!("trending_provider_errors_total", "provider" => provider).increment(1);
            Vec::new()
        }
    }
}

/// GET a URL and fail on non-2xx, returning the body text.
pub(crate) async fn get_text(req: reqwest::RequestBuilder, what: &str) -> Result<String> {
    let resp = req.send().await.with_context(|| format!("{what} http get()"))?;
    let resp = resp
        .error_for_status()
        .with_context(|| format!("{what} http status"))?;
    resp.text().await.with_context(|| format!("{what} http .text()"))
}

/// Build the configured live adapters.
pub fn build_providers(
    cfg: &TrendingConfig,
    github_token: Option<String>,
) -> Result<Vec<Arc<dyn SourceProvider>>> {
    let client = build_http_client(Duration::from_secs(cfg.http_timeout_secs))?;
    let mut out: Vec<Arc<dyn SourceProvider>> = Vec::with_capacity(cfg.sources.len());
    for kind in &cfg.sources {
        let p: Arc<dyn SourceProvider> = match kind {
            SourceKind::Google => match cfg.google_trends {
                GoogleTrendsMode::Rss => Arc::new(google_trends_rss::GoogleTrendsRssProvider::new(
                    client.clone(),
                    &cfg.geo,
                )),
                GoogleTrendsMode::DailyApi => Arc::new(
                    google_trends_daily::GoogleTrendsDailyProvider::new(client.clone(), &cfg.geo),
                ),
            },
            SourceKind::Github => Arc::new(github::GitHubTrendingProvider::new(
                client.clone(),
                github_token.clone(),
            )),
            SourceKind::HackerNews => {
                Arc::new(hacker_news::HackerNewsProvider::new(client.clone()))
            }
            SourceKind::DevTo => Arc::new(dev_to::DevToProvider::new(client.clone())),
        };
        out.push(p);
    }
    tracing::info!(
        target: "trending",
        providers = ?out.iter().map(|p| p.name()).collect::<Vec<_>>(),
        "source adapters configured"
    );
    Ok(out)
}

// src/trending/providers/github.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::time::Instant;

use crate::trending::providers::{get_text, settle};
use crate::trending::types::{SourceProvider, TrendingTopic};
use crate::trending::{cap_title, clamp_score, MAX_KEYWORDS, MAX_TOPICS_PER_SOURCE};

const NAME: &str = "GitHub Trending";
const SEARCH_URL: &str = "https://api.github.com/search/repositories";
/// Repositories created within this many days count as "trending".
const CREATED_WITHIN_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    name: String,
    html_url: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    owner: Option<Owner>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    #[serde(default)]
    avatar_url: Option<String>,
}

/// `min(100, stars / 1000 + 60)`.
pub fn star_score(stars: u64) -> u8 {
    clamp_score((stars / 1000).min(100) as i64 + 60)
}

pub struct GitHubTrendingProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        client: reqwest::Client,
        token: Option<String>,
    },
}

impl GitHubTrendingProvider {
    /// `token` is optional; without it the unauthenticated rate limit applies.
    pub fn new(client: reqwest::Client, token: Option<String>) -> Self {
        Self {
            mode: Mode::Http { client, token },
        }
    }

    pub fn from_fixture(json: &str) -> Self {
        Self {
            mode: Mode::Fixture(json.to_string()),
        }
    }

    pub fn parse_search(json: &str) -> Result<Vec<TrendingTopic>> {
        let resp: SearchResponse =
            serde_json::from_str(json).context("parsing github search json")?;

        Ok(resp
            .items
            .into_iter()
            .take(MAX_TOPICS_PER_SOURCE)
            .enumerate()
            .map(|(i, repo)| {
                let raw_desc = repo.description.filter(|d| !d.trim().is_empty());
                let title = format!(
                    "{}: {}",
                    repo.name,
                    raw_desc.as_deref().unwrap_or("Trending Repository")
                );
                let description =
                    raw_desc.unwrap_or_else(|| "Trending GitHub repository".to_string());

                let mut keywords = vec![repo.name.clone()];
                if let Some(lang) = repo.language.clone() {
                    keywords.push(lang);
                }
                keywords.push("GitHub".to_string());
                keywords.push("Open Source".to_string());
                keywords.truncate(MAX_KEYWORDS);

                let mut related_links = vec![repo.html_url];
                if let Some(home) = repo.homepage.filter(|h| !h.trim().is_empty()) {
                    related_links.push(home);
                }

                TrendingTopic {
                    id: format!("github-{}", i + 1),
                    title: cap_title(&title),
                    source: NAME.to_string(),
                    trend_score: star_score(repo.stargazers_count),
                    category: repo.language.unwrap_or_else(|| "Programming".to_string()),
                    description,
                    keywords,
                    image: repo.owner.and_then(|o| o.avatar_url),
                    videos: Vec::new(),
                    tweets: Vec::new(),
                    related_links,
                }
            })
            .collect())
    }

    async fn fetch_live(client: &reqwest::Client, token: Option<&str>) -> Result<Vec<TrendingTopic>> {
        let since = (Utc::now() - ChronoDuration::days(CREATED_WITHIN_DAYS))
            .format("%Y-%m-%d")
            .to_string();
        let mut req = client
            .get(SEARCH_URL)
            .query(&[
                ("q", format!("created:>{since}")),
                ("sort", "stars".to_string()),
                ("order", "desc".to_string()),
                ("per_page", MAX_TOPICS_PER_SOURCE.to_string()),
            ])
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        let body = get_text(req, "github search").await?;
        Self::parse_search(&body)
    }
}

#[async_trait]
impl SourceProvider for GitHubTrendingProvider {
    async fn fetch_trending(&self) -> Result<Vec<TrendingTopic>> {
        let t0 = Instant::now();
        let res = match &self.mode {
            Mode::Fixture(s) => Self::parse_search(s),
            Mode::Http { client, token } => Self::fetch_live(client, token.as_deref()).await,
        };
        Ok(settle(NAME, t0, res))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_score_follows_thousands_plus_sixty() {
        assert_eq!(star_score(0), 60);
        assert_eq!(star_score(999), 60);
        assert_eq!(star_score(12_500), 72);
        assert_eq!(star_score(40_000), 100);
        assert_eq!(star_score(u64::MAX), 100);
    }
}

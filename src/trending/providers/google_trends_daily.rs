// src/trending/providers/google_trends_daily.rs
//! Google Trends via the daily-trends JSON endpoint. Alternative to the RSS
//! adapter; which one runs is chosen by `trending.google_trends`.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;

use crate::trending::providers::{get_text, settle};
use crate::trending::types::{SourceProvider, TrendingTopic};
use crate::trending::{
    cap_title, normalize_text, parse_traffic, traffic_score, MAX_KEYWORDS, MAX_TOPICS_PER_SOURCE,
};

const NAME: &str = "Google Trends";

#[derive(Debug, Deserialize)]
struct DailyTrends {
    default: DailyDefault,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyDefault {
    #[serde(default)]
    trending_searches_days: Vec<Day>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Day {
    #[serde(default)]
    trending_searches: Vec<Search>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Search {
    title: Query,
    #[serde(default)]
    formatted_traffic: Option<String>,
    #[serde(default)]
    related_queries: Vec<Query>,
    #[serde(default)]
    image: Option<Image>,
    #[serde(default)]
    articles: Vec<ArticleRef>,
}

#[derive(Debug, Deserialize)]
struct Query {
    query: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Image {
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleRef {
    #[serde(default)]
    url: Option<String>,
}

pub struct GoogleTrendsDailyProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client, url: String },
}

impl GoogleTrendsDailyProvider {
    pub fn new(client: reqwest::Client, geo: &str) -> Self {
        Self {
            mode: Mode::Http {
                client,
                url: format!(
                    "https://trends.google.com/trends/api/dailytrends?hl=en-US&tz=0&geo={geo}&ns=15"
                ),
            },
        }
    }

    pub fn from_fixture(body: &str) -> Self {
        Self {
            mode: Mode::Fixture(body.to_string()),
        }
    }

    /// Parse the endpoint body, tolerating the `)]}',` anti-XSSI prefix.
    pub fn parse_body(body: &str) -> Result<Vec<TrendingTopic>> {
        let start = body
            .find('{')
            .ok_or_else(|| anyhow!("daily trends body has no JSON object"))?;
        let parsed: DailyTrends =
            serde_json::from_str(&body[start..]).context("parsing daily trends json")?;

        let searches = parsed
            .default
            .trending_searches_days
            .into_iter()
            .next()
            .map(|d| d.trending_searches)
            .unwrap_or_default();

        let mut out = Vec::with_capacity(MAX_TOPICS_PER_SOURCE);
        for s in searches.into_iter().take(MAX_TOPICS_PER_SOURCE) {
            let query = normalize_text(&s.title.query);
            if query.is_empty() {
                continue;
            }
            let traffic_raw = s.formatted_traffic.unwrap_or_default();

            let mut keywords = vec![query.clone()];
            keywords.extend(s.related_queries.into_iter().map(|q| q.query));
            keywords.truncate(MAX_KEYWORDS);

            out.push(TrendingTopic {
                id: format!("google-{}", out.len() + 1),
                title: cap_title(&query),
                source: NAME.to_string(),
                trend_score: traffic_score(parse_traffic(&traffic_raw)),
                category: "Technology".to_string(),
                description: if traffic_raw.is_empty() {
                    "Trending topic from Google".to_string()
                } else {
                    traffic_raw
                },
                keywords,
                image: s.image.and_then(|i| i.image_url),
                videos: Vec::new(),
                tweets: Vec::new(),
                related_links: s.articles.into_iter().filter_map(|a| a.url).collect(),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for GoogleTrendsDailyProvider {
    async fn fetch_trending(&self) -> Result<Vec<TrendingTopic>> {
        let t0 = Instant::now();
        let res = match &self.mode {
            Mode::Fixture(s) => Self::parse_body(s),
            Mode::Http { client, url } => {
                match get_text(client.get(url), "google daily trends").await {
                    Ok(body) => Self::parse_body(&body),
                    Err(e) => Err(e),
                }
            }
        };
        Ok(settle(NAME, t0, res))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

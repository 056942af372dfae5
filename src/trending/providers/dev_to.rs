// src/trending/providers/dev_to.rs
//! Developer-blog front page via the public top-articles listing.
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;

use crate::trending::providers::{get_text, settle};
use crate::trending::types::{SourceProvider, TrendingTopic};
use crate::trending::{
    cap_title, clamp_score, extract_keywords, normalize_text, MAX_KEYWORDS, MAX_TOPICS_PER_SOURCE,
};

const NAME: &str = "Dev.to";
const LISTING_URL: &str = "https://dev.to/api/articles";

#[derive(Debug, Deserialize)]
struct DevArticle {
    title: String,
    #[serde(default)]
    description: Option<String>,
    url: String,
    #[serde(default)]
    tag_list: Option<TagList>,
    #[serde(default)]
    positive_reactions_count: u64,
    #[serde(default)]
    cover_image: Option<String>,
}

// The listing returns an array; single-article payloads use a comma string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagList {
    List(Vec<String>),
    Joined(String),
}

impl TagList {
    fn into_vec(self) -> Vec<String> {
        match self {
            TagList::List(v) => v,
            TagList::Joined(s) => s
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

/// `min(95, 60 + reactions / 20)`.
pub fn reactions_score(reactions: u64) -> u8 {
    clamp_score((60 + (reactions / 20).min(100) as i64).min(95))
}

pub struct DevToProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

impl DevToProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http { client },
        }
    }

    pub fn from_fixture(json: &str) -> Self {
        Self {
            mode: Mode::Fixture(json.to_string()),
        }
    }

    pub fn parse_listing(json: &str) -> Result<Vec<TrendingTopic>> {
        let articles: Vec<DevArticle> =
            serde_json::from_str(json).context("parsing dev.to listing json")?;

        let mut out = Vec::with_capacity(MAX_TOPICS_PER_SOURCE);
        for a in articles {
            let title = normalize_text(&a.title);
            // Very short titles are usually series stubs or placeholders.
            if title.chars().count() <= 10 {
                continue;
            }
            let mut keywords = a.tag_list.map(TagList::into_vec).unwrap_or_default();
            if keywords.is_empty() {
                keywords = extract_keywords(&title);
            }
            keywords.truncate(MAX_KEYWORDS);

            out.push(TrendingTopic {
                id: format!("devto-{}", out.len() + 1),
                title: cap_title(&title),
                source: NAME.to_string(),
                trend_score: reactions_score(a.positive_reactions_count),
                category: "Development".to_string(),
                description: a
                    .description
                    .map(|d| normalize_text(&d))
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| format!("Popular article: {title}")),
                keywords,
                image: a.cover_image.filter(|c| !c.trim().is_empty()),
                videos: Vec::new(),
                tweets: Vec::new(),
                related_links: vec![a.url],
            });
            if out.len() == MAX_TOPICS_PER_SOURCE {
                break;
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for DevToProvider {
    async fn fetch_trending(&self) -> Result<Vec<TrendingTopic>> {
        let t0 = Instant::now();
        let res = match &self.mode {
            Mode::Fixture(s) => Self::parse_listing(s),
            Mode::Http { client } => {
                let req = client.get(LISTING_URL).query(&[
                    ("top", "1".to_string()),
                    ("per_page", MAX_TOPICS_PER_SOURCE.to_string()),
                ]);
                match get_text(req, "dev.to listing").await {
                    Ok(body) => Self::parse_listing(&body),
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

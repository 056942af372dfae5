// src/trending/providers/google_trends_rss.rs
//! Google Trends via the public "trending now" RSS feed.
use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Instant;

use crate::trending::providers::{get_text, settle};
use crate::trending::types::{SourceProvider, TrendingTopic};
use crate::trending::{
    cap_title, extract_keywords, normalize_text, parse_traffic, traffic_score, MAX_KEYWORDS,
    MAX_TOPICS_PER_SOURCE,
};

const NAME: &str = "Google Trends";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

// `ht:` elements are matched by local name; quick-xml drops the prefix.
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    approx_traffic: Option<String>,
    picture: Option<String>,
    #[serde(rename = "news_item", default)]
    news_items: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    #[serde(rename = "news_item_title")]
    title: Option<String>,
    #[serde(rename = "news_item_url")]
    url: Option<String>,
}

pub struct GoogleTrendsRssProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client, url: String },
}

impl GoogleTrendsRssProvider {
    pub fn new(client: reqwest::Client, geo: &str) -> Self {
        Self {
            mode: Mode::Http {
                client,
                url: format!("https://trends.google.com/trending/rss?geo={geo}"),
            },
        }
    }

    pub fn from_fixture(xml: &str) -> Self {
        Self {
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn parse_feed(xml: &str) -> Result<Vec<TrendingTopic>> {
        let rss: Rss = from_str(&scrub_html_entities_for_xml(xml))
            .context("parsing google trends rss xml")?;

        let mut out = Vec::with_capacity(MAX_TOPICS_PER_SOURCE);
        for it in rss.channel.item {
            let query = normalize_text(it.title.as_deref().unwrap_or_default());
            if query.is_empty() {
                continue;
            }
            let traffic_raw = it.approx_traffic.unwrap_or_default();
            let traffic = parse_traffic(&traffic_raw);

            let headline = it
                .news_items
                .iter()
                .filter_map(|n| n.title.as_deref())
                .map(normalize_text)
                .find(|t| !t.is_empty());

            let mut keywords = vec![query.clone()];
            for n in it.news_items.iter().filter_map(|n| n.title.as_deref()) {
                for k in extract_keywords(n) {
                    if !keywords.iter().any(|x| x.eq_ignore_ascii_case(&k)) {
                        keywords.push(k);
                    }
                }
            }
            keywords.truncate(MAX_KEYWORDS);

            out.push(TrendingTopic {
                id: format!("google-{}", out.len() + 1),
                title: cap_title(&query),
                source: NAME.to_string(),
                trend_score: traffic_score(traffic),
                category: "Technology".to_string(),
                description: headline.unwrap_or_else(|| {
                    if traffic_raw.is_empty() {
                        "Trending topic from Google".to_string()
                    } else {
                        format!("{traffic_raw} searches")
                    }
                }),
                keywords,
                image: it.picture.filter(|p| !p.trim().is_empty()),
                videos: Vec::new(),
                tweets: Vec::new(),
                related_links: it.news_items.into_iter().filter_map(|n| n.url).collect(),
            });
            if out.len() == MAX_TOPICS_PER_SOURCE {
                break;
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for GoogleTrendsRssProvider {
    async fn fetch_trending(&self) -> Result<Vec<TrendingTopic>> {
        let t0 = Instant::now();
        let res = match &self.mode {
            Mode::Fixture(s) => Self::parse_feed(s),
            Mode::Http { client, url } => match get_text(client.get(url), "google trends rss").await
            {
                Ok(body) => Self::parse_feed(&body),
                Err(e) => Err(e),
            },
        };
        Ok(settle(NAME, t0, res))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss xmlns:ht="https://trends.google.com/trending/rss" version="2.0">
  <channel>
    <title>Daily Search Trends</title>
    <item>
      <title>bun 2</title>
      <ht:approx_traffic>20,000+</ht:approx_traffic>
      <ht:picture>https://img.example.test/bun.png</ht:picture>
      <ht:news_item>
        <ht:news_item_title>Bun 2 ships a new bundler</ht:news_item_title>
        <ht:news_item_url>https://news.example.test/bun</ht:news_item_url>
      </ht:news_item>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn prefixed_elements_feed_score_image_and_links() {
        let topics = GoogleTrendsRssProvider::parse_feed(FEED).unwrap();
        assert_eq!(topics.len(), 1);
        let t = &topics[0];
        assert_eq!(t.trend_score, 90);
        assert_eq!(t.image.as_deref(), Some("https://img.example.test/bun.png"));
        assert_eq!(t.related_links, vec!["https://news.example.test/bun"]);
        assert_eq!(t.description, "Bun 2 ships a new bundler");
    }
}

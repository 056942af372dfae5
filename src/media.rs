//! # Media Enricher
//!
//! Resolves a representative image plus video and social-post links for a
//! topic title. Resolution is a chain of tiers tried in order:
//!
//! 1. keyed API providers (Unsplash, YouTube, Twitter), only when a key is set;
//! 2. curated deterministic tables keyed by keyword category;
//! 3. a generic default.
//!
//! `resolve` never fails: a provider error only moves on to the next tier.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::trending::providers::{build_http_client, get_text};
use crate::trending::MediaContent;

const IMAGE_STOPWORDS: &[&str] = &["the", "and", "for", "with", "how", "what"];

pub const GENERIC_VIDEO: &str = "https://www.youtube.com/embed/ScMzIvxBSi4";
pub const GENERIC_TWEET: &str = "https://twitter.com/techcrunch/status/1735023456789012345";

/// Keys for the optional media APIs. `None` means "use fallbacks".
#[derive(Debug, Clone, Default)]
pub struct MediaKeys {
    pub unsplash_access_key: Option<String>,
    pub youtube_api_key: Option<String>,
    pub twitter_bearer_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Tweet,
}

/// One keyed tier. `Ok(None)` = nothing found, try the next tier.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    fn kind(&self) -> MediaKind;
    async fn lookup(&self, topic: &str) -> Result<Option<Vec<String>>>;
    fn name(&self) -> &'static str;
}

pub struct MediaEnricher {
    providers: Vec<Arc<dyn MediaProvider>>,
}

impl MediaEnricher {
    pub fn new(providers: Vec<Arc<dyn MediaProvider>>) -> Self {
        Self { providers }
    }

    /// Enricher with only deterministic fallbacks.
    pub fn fallback_only() -> Self {
        Self::new(Vec::new())
    }

    /// Wire a keyed provider for every key that is present.
    pub fn from_keys(keys: &MediaKeys, timeout: Duration) -> Result<Self> {
        let client = build_http_client(timeout)?;
        let mut providers: Vec<Arc<dyn MediaProvider>> = Vec::new();
        if let Some(k) = keys.unsplash_access_key.clone() {
            providers.push(Arc::new(UnsplashImageSearch::new(client.clone(), k)));
        }
        if let Some(k) = keys.youtube_api_key.clone() {
            providers.push(Arc::new(YouTubeSearch::new(client.clone(), k)));
        }
        if let Some(k) = keys.twitter_bearer_token.clone() {
            providers.push(Arc::new(TwitterSearch::new(client.clone(), k)));
        }
        tracing::info!(
            target: "media",
            keyed = ?providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            "media enricher configured"
        );
        Ok(Self::new(providers))
    }

    pub async fn resolve(&self, topic: &str) -> MediaContent {
        let image = match self.keyed(MediaKind::Image, topic).await {
            Some(mut v) => Some(v.swap_remove(0)),
            None => Some(fallback_image(topic)),
        };
        let videos = match self.keyed(MediaKind::Video, topic).await {
            Some(v) => v,
            None => curated_videos(topic).unwrap_or_else(|| vec![GENERIC_VIDEO.to_string()]),
        };
        let tweets = match self.keyed(MediaKind::Tweet, topic).await {
            Some(v) => v,
            None => curated_tweets(topic).unwrap_or_else(|| vec![GENERIC_TWEET.to_string()]),
        };
        MediaContent {
            image,
            videos,
            tweets,
        }
    }

    async fn keyed(&self, kind: MediaKind, topic: &str) -> Option<Vec<String>> {
        for p in self.providers.iter().filter(|p| p.kind() == kind) {
            match p.lookup(topic).await {
                Ok(Some(v)) if !v.is_empty() => {
                    tracing::debug!(target: "media", provider = p.name(), topic, "keyed hit");
                    return Some(v);
                }
                Ok(_) => {
                    tracing::debug!(target: "media", provider = p.name(), topic, "keyed miss");
                }
                Err(e) => {
                    tracing::warn!(target: "media", provider = p.name(), error = ?e, "media provider failed");
                }
            }
        }
        None
    }
}

fn topic_words(topic: &str) -> Vec<String> {
    topic
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn relevant_words(topic: &str) -> Vec<String> {
    topic_words(topic)
        .into_iter()
        .filter(|w| w.chars().count() > 3 && !IMAGE_STOPWORDS.contains(&w.as_str()))
        .collect()
}

fn any_of(words: &[String], set: &[&str]) -> bool {
    words.iter().any(|w| set.contains(&w.as_str()))
}

/// First two relevant words plus a generic domain qualifier.
pub fn image_search_terms(topic: &str) -> String {
    let words = relevant_words(topic);
    if words.is_empty() {
        return "technology programming".to_string();
    }
    format!("{} technology", words[..words.len().min(2)].join(" "))
}

/// `None` when the topic has no relevant words to search for.
pub fn video_search_terms(topic: &str) -> Option<String> {
    let words = relevant_words(topic);
    if words.is_empty() {
        return None;
    }
    Some(format!("{} tutorial explanation", words[..words.len().min(3)].join(" ")))
}

/// `None` when the topic has no relevant words; recent search rejects
/// operator-only queries.
pub fn tweet_search_terms(topic: &str) -> Option<String> {
    let words = relevant_words(topic);
    if words.is_empty() {
        return None;
    }
    Some(format!("{} -is:retweet lang:en", words[..words.len().min(2)].join(" ")))
}

/// Category keyword for the templated fallback image.
pub fn image_category(topic: &str) -> &'static str {
    let w = topic_words(topic);
    if any_of(&w, &["react", "angular", "vue", "frontend", "web"]) {
        "web-development"
    } else if any_of(&w, &["ai", "machine", "learning", "artificial"]) {
        "artificial-intelligence"
    } else if any_of(&w, &["data", "analytics", "science"]) {
        "data-science"
    } else if any_of(&w, &["programming", "coding", "code"]) {
        "computer-programming"
    } else if any_of(&w, &["software", "development", "dev"]) {
        "software-development"
    } else {
        "technology"
    }
}

pub fn fallback_image(topic: &str) -> String {
    format!("https://source.unsplash.com/800x400/?{}", image_category(topic))
}

/// Curated tutorial videos; `None` when no category matches.
pub fn curated_videos(topic: &str) -> Option<Vec<String>> {
    let w = topic_words(topic);
    let id = if any_of(&w, &["react", "angular", "vue"]) {
        "w7ejDZ8SWv8"
    } else if any_of(&w, &["javascript", "js"]) {
        "PkZNo7MFNFg"
    } else if any_of(&w, &["python"]) {
        "rfscVS0vtbw"
    } else if any_of(&w, &["ai", "artificial", "intelligence"]) {
        "aircAruvnKk"
    } else if any_of(&w, &["web", "development", "html", "css"]) {
        "G3e-cpL7ofc"
    } else {
        return None;
    };
    Some(vec![format!("https://www.youtube.com/embed/{id}")])
}

/// Curated posts from relevant accounts; `None` when no category matches.
pub fn curated_tweets(topic: &str) -> Option<Vec<String>> {
    let w = topic_words(topic);
    let account = if any_of(&w, &["react", "javascript", "frontend"]) {
        "reactjs"
    } else if any_of(&w, &["typescript", "ts"]) {
        "typescript"
    } else if any_of(&w, &["nextjs", "next", "vercel"]) {
        "vercel"
    } else if any_of(&w, &["github", "git", "open", "source"]) {
        "github"
    } else if any_of(&w, &["ai", "openai", "chatgpt"]) {
        "openai"
    } else if any_of(&w, &["google", "chrome", "dev"]) {
        "googlechrome"
    } else {
        return None;
    };
    Some(vec![format!(
        "https://twitter.com/{account}/status/1735023456789012345"
    )])
}

// ------------------------------------------------------------
// Keyed providers
// ------------------------------------------------------------

pub struct UnsplashImageSearch {
    client: reqwest::Client,
    access_key: String,
}

impl UnsplashImageSearch {
    pub fn new(client: reqwest::Client, access_key: String) -> Self {
        Self { client, access_key }
    }
}

#[async_trait]
impl MediaProvider for UnsplashImageSearch {
    fn kind(&self) -> MediaKind {
        MediaKind::Image
    }

    async fn lookup(&self, topic: &str) -> Result<Option<Vec<String>>> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            results: Vec<Photo>,
        }
        #[derive(Deserialize)]
        struct Photo {
            urls: Urls,
        }
        #[derive(Deserialize)]
        struct Urls {
            regular: String,
        }

        let req = self
            .client
            .get("https://api.unsplash.com/search/photos")
            .query(&[
                ("query", image_search_terms(topic).as_str()),
                ("per_page", "1"),
                ("orientation", "landscape"),
            ])
            .header("Authorization", format!("Client-ID {}", self.access_key));
        let body = get_text(req, "unsplash search").await?;
        let resp: Resp = serde_json::from_str(&body).context("parsing unsplash json")?;
        Ok(resp.results.into_iter().next().map(|p| vec![p.urls.regular]))
    }

    fn name(&self) -> &'static str {
        "unsplash"
    }
}

pub struct YouTubeSearch {
    client: reqwest::Client,
    api_key: String,
}

impl YouTubeSearch {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl MediaProvider for YouTubeSearch {
    fn kind(&self) -> MediaKind {
        MediaKind::Video
    }

    async fn lookup(&self, topic: &str) -> Result<Option<Vec<String>>> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            items: Vec<Item>,
        }
        #[derive(Deserialize)]
        struct Item {
            id: VideoId,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct VideoId {
            #[serde(default)]
            video_id: Option<String>,
        }

        let Some(terms) = video_search_terms(topic) else {
            return Ok(None);
        };
        let req = self
            .client
            .get("https://www.googleapis.com/youtube/v3/search")
            .query(&[
                ("part", "snippet"),
                ("q", terms.as_str()),
                ("type", "video"),
                ("maxResults", "1"),
                ("videoDuration", "medium"),
                ("relevanceLanguage", "en"),
                ("key", self.api_key.as_str()),
            ]);
        let body = get_text(req, "youtube search").await?;
        let resp: Resp = serde_json::from_str(&body).context("parsing youtube json")?;
        Ok(resp
            .items
            .into_iter()
            .find_map(|i| i.id.video_id)
            .map(|id| vec![format!("https://www.youtube.com/embed/{id}")]))
    }

    fn name(&self) -> &'static str {
        "youtube"
    }
}

pub struct TwitterSearch {
    client: reqwest::Client,
    bearer_token: String,
}

impl TwitterSearch {
    pub fn new(client: reqwest::Client, bearer_token: String) -> Self {
        Self {
            client,
            bearer_token,
        }
    }
}

#[async_trait]
impl MediaProvider for TwitterSearch {
    fn kind(&self) -> MediaKind {
        MediaKind::Tweet
    }

    async fn lookup(&self, topic: &str) -> Result<Option<Vec<String>>> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            data: Vec<Tweet>,
        }
        #[derive(Deserialize)]
        struct Tweet {
            id: String,
        }

        let Some(terms) = tweet_search_terms(topic) else {
            return Ok(None);
        };
        // recent search rejects max_results below 10
        let req = self
            .client
            .get("https://api.twitter.com/2/tweets/search/recent")
            .query(&[
                ("query", terms.as_str()),
                ("max_results", "10"),
            ])
            .bearer_auth(&self.bearer_token);
        let body = get_text(req, "twitter search").await?;
        let resp: Resp = serde_json::from_str(&body).context("parsing twitter json")?;
        Ok(resp
            .data
            .into_iter()
            .next()
            .map(|t| vec![format!("https://twitter.com/i/status/{}", t.id)]))
    }

    fn name(&self) -> &'static str {
        "twitter"
    }
}

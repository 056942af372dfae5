// src/generator.rs
//! External article-generation function.
//!
//! The generator is opaque and possibly slow: topic in, article fields out.
//! Persisting the result is the bot's job.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::trending::{MediaContent, TrendingTopic};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub topic: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub media: MediaContent,
}

impl From<&TrendingTopic> for GenerationRequest {
    fn from(t: &TrendingTopic) -> Self {
        Self {
            topic: t.title.clone(),
            description: t.description.clone(),
            keywords: t.keywords.clone(),
            media: t.media(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArticle {
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(default)]
    pub article: Option<GeneratedArticle>,
    #[serde(default)]
    pub error: Option<String>,
}

impl GenerationResponse {
    /// The article on success; otherwise the reported error.
    pub fn into_article(self) -> Result<GeneratedArticle> {
        match (self.success, self.article) {
            (true, Some(a)) => Ok(a),
            (true, None) => Err(anyhow!("generator reported success without an article")),
            (false, _) => Err(anyhow!(self
                .error
                .unwrap_or_else(|| "article generation failed".to_string()))),
        }
    }
}

#[async_trait::async_trait]
pub trait ArticleGenerator: Send + Sync {
    async fn generate(&self, req: &GenerationRequest) -> Result<GenerationResponse>;
    fn name(&self) -> &'static str;
}

/// POSTs the request as JSON to a configured endpoint.
pub struct HttpArticleGenerator {
    endpoint: String,
    client: Client,
}

impl HttpArticleGenerator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build generator http client")?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ArticleGenerator for HttpArticleGenerator {
    async fn generate(&self, req: &GenerationRequest) -> Result<GenerationResponse> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(req)
            .send()
            .await
            .context("generator post")?
            .error_for_status()
            .context("generator non-2xx")?;
        resp.json::<GenerationResponse>()
            .await
            .context("generator response json")
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Used when no endpoint is configured: every call fails softly.
pub struct DisabledGenerator;

#[async_trait::async_trait]
impl ArticleGenerator for DisabledGenerator {
    async fn generate(&self, _req: &GenerationRequest) -> Result<GenerationResponse> {
        Ok(GenerationResponse {
            success: false,
            article: None,
            error: Some("article generator not configured".into()),
        })
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

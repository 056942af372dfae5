// src/config/mod.rs
//! Application configuration.
//!
//! Lookup order for the file:
//! 1) $TRENDWISE_CONFIG_PATH (must exist if set)
//! 2) config/trendwise.toml
//! 3) built-in defaults
//!
//! Secrets may be written as `"ENV"`, meaning "read the conventional env var".
//! A missing secret is never an error; it just selects the fallback path.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bot::AutoGenerationConfig;
use crate::media::MediaKeys;

const ENV_PATH: &str = "TRENDWISE_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/trendwise.toml";
const PLACEHOLDER_KEY: &str = "demo-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Google,
    Github,
    HackerNews,
    DevTo,
}

/// Which Google Trends adapter to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GoogleTrendsMode {
    #[default]
    Rss,
    DailyApi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendingConfig {
    pub cache_ttl_secs: u64,
    pub limit: usize,
    pub sources: Vec<SourceKind>,
    pub google_trends: GoogleTrendsMode,
    pub geo: String,
    pub http_timeout_secs: u64,
    pub enrich_media: bool,
    pub github_token: String,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 3600,
            limit: 15,
            sources: vec![
                SourceKind::Google,
                SourceKind::Github,
                SourceKind::HackerNews,
                SourceKind::DevTo,
            ],
            google_trends: GoogleTrendsMode::Rss,
            geo: "US".into(),
            http_timeout_secs: 10,
            enrich_media: true,
            github_token: "ENV".into(),
        }
    }
}

impl TrendingConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn github_token(&self) -> Option<String> {
        resolve_secret(&self.github_token, "GITHUB_TOKEN")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub unsplash_access_key: String,
    pub youtube_api_key: String,
    pub twitter_bearer_token: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            unsplash_access_key: "ENV".into(),
            youtube_api_key: "ENV".into(),
            twitter_bearer_token: "ENV".into(),
        }
    }
}

impl MediaConfig {
    pub fn keys(&self) -> MediaKeys {
        MediaKeys {
            unsplash_access_key: resolve_secret(&self.unsplash_access_key, "UNSPLASH_ACCESS_KEY"),
            youtube_api_key: resolve_secret(&self.youtube_api_key, "YOUTUBE_API_KEY"),
            twitter_bearer_token: resolve_secret(
                &self.twitter_bearer_token,
                "TWITTER_BEARER_TOKEN",
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub enabled: bool,
    pub autostart: bool,
    pub max_articles_per_run: usize,
    pub min_trend_score: u8,
    pub cooldown_hours: u64,
    pub generation_delay_ms: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        let auto = AutoGenerationConfig::default();
        Self {
            enabled: auto.enabled,
            autostart: false,
            max_articles_per_run: auto.max_articles_per_run,
            min_trend_score: auto.min_trend_score,
            cooldown_hours: auto.cooldown_hours,
            generation_delay_ms: 2_000,
        }
    }
}

impl BotConfig {
    pub fn auto_generation(&self) -> AutoGenerationConfig {
        AutoGenerationConfig {
            max_articles_per_run: self.max_articles_per_run,
            min_trend_score: self.min_trend_score,
            cooldown_hours: self.cooldown_hours,
            enabled: self.enabled,
        }
    }

    pub fn generation_delay(&self) -> Duration {
        Duration::from_millis(self.generation_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Endpoint of the external article-generation function. Unset disables generation.
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub trending: TrendingConfig,
    pub media: MediaConfig,
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub generator: GeneratorConfig,
}

impl AppConfig {
    /// Parse TOML without touching the environment.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing trendwise config")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut cfg = Self::parse(&content)?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Operational knobs that deployments set through the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse::<u64>("TREND_CACHE_TTL_SECS") {
            self.trending.cache_ttl_secs = v;
        }
        if let Some(v) = env_bool("BOT_ENABLED") {
            self.bot.enabled = v;
        }
        if let Some(v) = env_bool("BOT_AUTOSTART") {
            self.bot.autostart = v;
        }
        if let Some(v) = env_nonempty("ARTICLE_GENERATOR_URL") {
            self.generator.endpoint = Some(v);
        }
        if let Some(v) = env_nonempty("TRENDWISE_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }
    }
}

/// `"ENV"` reads `env_var`; blanks and the demo placeholder count as unset.
pub fn resolve_secret(raw: &str, env_var: &str) -> Option<String> {
    let raw = raw.trim();
    let value = if raw.eq_ignore_ascii_case("env") {
        std::env::var(env_var).ok()?
    } else {
        raw.to_string()
    };
    let value = value.trim();
    if value.is_empty() || value == PLACEHOLDER_KEY {
        None
    } else {
        Some(value.to_string())
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env_nonempty(key)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable env override");
            None
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let raw = env_nonempty(key)?;
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring unparsable env override");
            None
        }
    }
}

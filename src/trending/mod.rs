// src/trending/mod.rs
//! Trending-topic pipeline: source adapters, aggregation, TTL cache with
//! durable fallback, plus the text helpers the adapters share.

pub mod aggregator;
pub mod cache;
pub mod fallback;
pub mod providers;
pub mod types;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashSet;

pub use types::{MediaContent, SourceProvider, TrendSource, TrendingTopic};

/// Display cap for topic titles.
pub const MAX_TITLE_CHARS: usize = 80;
/// Each adapter yields at most this many topics.
pub const MAX_TOPICS_PER_SOURCE: usize = 10;
/// Keywords kept per topic.
pub const MAX_KEYWORDS: usize = 5;

const STOPWORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "and", "a", "to", "an", "as", "are", "was", "for", "with",
    "that", "this", "from", "your", "into", "about", "what", "how", "why", "when", "have",
];

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "trending_topics_fetched_total",
            "Topics returned by source adapters."
        );
        describe_counter!(
            "trending_provider_errors_total",
            "Adapter fetch/parse errors (converted to empty results)."
        );
        describe_histogram!("trending_fetch_ms", "Adapter fetch time in milliseconds.");
        describe_counter!("trend_cache_hits_total", "Reads served from the fresh cache.");
        describe_counter!(
            "trend_cache_misses_total",
            "Reads that found the cache empty or stale."
        );
        describe_counter!(
            "trend_fallback_total",
            "Reads served from the durable snapshot or built-in list."
        );
        describe_gauge!("trend_cache_ttl_ms", "Configured trend cache TTL.");
        describe_counter!("bot_cycles_total", "Generation cycles started.");
        describe_counter!(
            "bot_cycles_skipped_total",
            "Cycle requests ignored because a cycle was running."
        );
        describe_counter!(
            "bot_articles_generated_total",
            "Articles produced by the generation bot."
        );
        describe_counter!(
            "bot_generation_failures_total",
            "Per-topic generation failures."
        );
    });
}

/// Decode entities, strip tags, normalize quotes and collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Cap a title to [`MAX_TITLE_CHARS`] characters (char-boundary safe).
pub fn cap_title(s: &str) -> String {
    s.chars().take(MAX_TITLE_CHARS).collect::<String>().trim_end().to_string()
}

/// Lowercased, punctuation-free tokens longer than 3 chars, minus stopwords,
/// de-duplicated in first-seen order, at most [`MAX_KEYWORDS`].
pub fn extract_keywords(text: &str) -> Vec<String> {
    static RE_PUNCT: OnceCell<Regex> = OnceCell::new();
    let re = RE_PUNCT.get_or_init(|| Regex::new(r"[^\w\s]").expect("punct regex"));
    let lowered = text.to_lowercase();
    let cleaned = re.replace_all(&lowered, "");

    let mut seen = HashSet::new();
    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > 3 && !STOPWORDS.contains(w))
        .filter(|w| seen.insert(w.to_string()))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// Parse traffic strings like `"200,000+"`, `"50K+"` or `"1.5M+"`.
pub fn parse_traffic(raw: &str) -> u64 {
    let t: String = raw
        .chars()
        .filter(|c| !matches!(c, '+' | ',' | ' '))
        .collect();
    let (num, mult) = match t.chars().last().map(|c| c.to_ascii_uppercase()) {
        Some('K') => (&t[..t.len() - 1], 1_000f64),
        Some('M') => (&t[..t.len() - 1], 1_000_000f64),
        Some('B') => (&t[..t.len() - 1], 1_000_000_000f64),
        _ => (t.as_str(), 1f64),
    };
    num.parse::<f64>()
        .map(|v| (v * mult).max(0.0) as u64)
        .unwrap_or(0)
}

/// Search-traffic normalization: `min(100, 70 + 5 * floor(log10(traffic)))`.
pub fn traffic_score(traffic: u64) -> u8 {
    match traffic.checked_ilog10() {
        Some(mag) => clamp_score(70 + 5 * i64::from(mag)),
        None => 70,
    }
}

pub fn clamp_score(v: i64) -> u8 {
    v.clamp(0, 100) as u8
}

/// URL slug: lowercase ASCII alphanumerics and dashes, max 60 chars.
pub fn slugify(title: &str) -> String {
    static RE_STRIP: OnceCell<Regex> = OnceCell::new();
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    static RE_DASH: OnceCell<Regex> = OnceCell::new();

    let lowered = title.to_lowercase();
    let stripped = RE_STRIP
        .get_or_init(|| Regex::new(r"[^a-z0-9\s-]").expect("slug regex"))
        .replace_all(&lowered, "");
    let dashed = RE_WS
        .get_or_init(|| Regex::new(r"\s+").expect("slug ws regex"))
        .replace_all(stripped.trim(), "-");
    let collapsed = RE_DASH
        .get_or_init(|| Regex::new(r"-+").expect("slug dash regex"))
        .replace_all(&dashed, "-");

    collapsed
        .trim_matches('-')
        .chars()
        .take(60)
        .collect::<String>()
        .trim_end_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_strips_tags_and_entities() {
        let out = normalize_text("  <b>Rust&nbsp;&nbsp;1.80</b> &ldquo;ships&rdquo; ");
        assert_eq!(out, r#"Rust 1.80 "ships""#);
    }

    #[test]
    fn keywords_drop_short_words_and_stopwords() {
        let kw = extract_keywords("How the new React Compiler changes React apps, with hooks!");
        assert_eq!(kw, vec!["react", "compiler", "changes", "apps", "hooks"]);
    }

    #[test]
    fn keywords_are_capped() {
        let kw = extract_keywords("alpha bravo charlie delta echoo foxtrot golfy");
        assert_eq!(kw.len(), MAX_KEYWORDS);
    }

    #[test]
    fn traffic_parsing_handles_suffixes() {
        assert_eq!(parse_traffic("200,000+"), 200_000);
        assert_eq!(parse_traffic("50K+"), 50_000);
        assert_eq!(parse_traffic("1.5M+"), 1_500_000);
        assert_eq!(parse_traffic("n/a"), 0);
    }

    #[test]
    fn traffic_score_is_monotonic_and_capped() {
        assert_eq!(traffic_score(0), 70);
        assert_eq!(traffic_score(100), 80);
        assert_eq!(traffic_score(200_000), 95);
        assert_eq!(traffic_score(50_000_000), 100);
        assert!(traffic_score(999) <= traffic_score(1_000));
    }

    #[test]
    fn slugify_matches_url_rules() {
        assert_eq!(slugify("React 19: Server Actions!"), "react-19-server-actions");
        assert_eq!(slugify("  a -- b  "), "a-b");
        assert!(slugify(&"word ".repeat(40)).chars().count() <= 60);
    }

    #[test]
    fn cap_title_respects_char_boundaries() {
        let long = "é".repeat(100);
        assert_eq!(cap_title(&long).chars().count(), MAX_TITLE_CHARS);
    }
}

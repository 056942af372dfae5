// src/trending/fallback.rs
//! Built-in topics served when neither a live batch nor a durable snapshot is available.

use crate::trending::TrendingTopic;

fn topic(
    rank: usize,
    title: &str,
    source: &str,
    score: u8,
    category: &str,
    description: &str,
    keywords: &[&str],
) -> TrendingTopic {
    TrendingTopic {
        id: format!("trend-{rank}"),
        title: title.to_string(),
        source: source.to_string(),
        trend_score: score,
        category: category.to_string(),
        description: description.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        image: None,
        videos: Vec::new(),
        tweets: Vec::new(),
        related_links: Vec::new(),
    }
}

/// Static list, already sorted by score descending.
pub fn builtin_topics() -> Vec<TrendingTopic> {
    let mut v = vec![
        topic(
            1,
            "React 19 Server Actions",
            "Google Trends",
            95,
            "Web Development",
            "New React 19 features reshaping server-side interactions",
            &["React", "Server Actions", "JavaScript", "Frontend"],
        ),
        topic(
            2,
            "AI Code Assistants 2025",
            "Google Trends",
            92,
            "Artificial Intelligence",
            "Latest AI coding tools changing development workflows",
            &["AI", "Code Assistant", "Programming", "Automation"],
        ),
        topic(
            3,
            "Bun 1.1: Ultra-fast JavaScript Runtime",
            "GitHub Trending",
            88,
            "Runtime",
            "Bun keeps gaining ground as a Node.js alternative",
            &["Bun", "JavaScript", "Runtime", "Performance"],
        ),
        topic(
            4,
            "WebAssembly in Production: Success Stories",
            "Hacker News",
            85,
            "Web Technologies",
            "Teams sharing their WebAssembly deployment experience",
            &["WebAssembly", "Performance", "Production", "WASM"],
        ),
    ];
    v[0].image =
        Some("https://images.unsplash.com/photo-1633356122544-f134324a6cee?w=800&q=80".into());
    v
}

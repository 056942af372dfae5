// tests/aggregator.rs
//
// Fan-out/fan-in behaviour of the Aggregator over mock adapters.

mod common;

use std::sync::Arc;

use common::{BrokenProvider, FixedProvider};
use trendwise::media::MediaEnricher;
use trendwise::trending::aggregator::Aggregator;
use trendwise::trending::{SourceProvider, TrendingTopic};

fn scores(batch: &[TrendingTopic]) -> Vec<u8> {
    batch.iter().map(|t| t.trend_score).collect()
}

#[tokio::test]
async fn merges_sorts_and_reranks_across_adapters() {
    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        FixedProvider::scores("a", &[95]),
        FixedProvider::scores("b", &[70, 99]),
        Arc::new(BrokenProvider),
    ];
    let out = Aggregator::new(providers).aggregate().await;

    assert_eq!(scores(&out), vec![99, 95, 70]);
    let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["trend-1", "trend-2", "trend-3"]);
    assert_eq!(out[0].title, "b 99");
}

#[tokio::test]
async fn every_adapter_failing_yields_empty_batch() {
    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        Arc::new(BrokenProvider),
        FixedProvider::scores("empty", &[]),
    ];
    let out = Aggregator::new(providers).aggregate().await;
    assert!(out.is_empty());
}

#[tokio::test]
async fn batch_is_sorted_and_capped_at_fifteen() {
    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        FixedProvider::scores("a", &[10, 20, 30, 40, 50, 60, 70, 80]),
        FixedProvider::scores("b", &[15, 25, 35, 45, 55, 65, 75, 85]),
        FixedProvider::scores("c", &[5, 100, 90]),
    ];
    let out = Aggregator::new(providers).aggregate().await;

    assert_eq!(out.len(), 15);
    assert!(out.windows(2).all(|w| w[0].trend_score >= w[1].trend_score));
    assert_eq!(out[0].trend_score, 100);
    assert_eq!(out.last().map(|t| t.id.as_str()), Some("trend-15"));
}

#[tokio::test]
async fn each_adapter_contributes_at_most_ten() {
    let many: Vec<u8> = (50..70).collect();
    let providers: Vec<Arc<dyn SourceProvider>> = vec![FixedProvider::scores("flood", &many)];
    let out = Aggregator::new(providers).aggregate().await;
    assert_eq!(out.len(), 10);
}

#[tokio::test]
async fn enricher_fills_only_missing_media() {
    let mut with_image = common::topic("React Server Components", 90);
    with_image.image = Some("https://cdn.example.test/own.png".into());
    let providers: Vec<Arc<dyn SourceProvider>> = vec![Arc::new(FixedProvider {
        name: "media",
        topics: vec![with_image, common::topic("Kubernetes autoscaling", 80)],
    })];

    let out = Aggregator::new(providers)
        .with_enricher(Arc::new(MediaEnricher::fallback_only()))
        .aggregate()
        .await;

    assert_eq!(out[0].image.as_deref(), Some("https://cdn.example.test/own.png"));
    assert!(!out[0].videos.is_empty());
    assert!(out[1].image.is_some());
    assert!(!out[1].tweets.is_empty());
}

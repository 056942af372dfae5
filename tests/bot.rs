// tests/bot.rs
//
// Generation cycle behaviour of the BackendBot against in-memory stores and
// a recording generator. Time is paused so the inter-call delay is instant.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use common::{topic, RecordingGenerator, ScriptedSource};
use trendwise::bot::{
    AutoGenerationConfig, BackendBot, BotRunStatistics, CycleOutcome, MIN_CYCLE_INTERVAL,
    STATS_RETENTION,
};
use trendwise::store::memory::MemoryStore;
use trendwise::store::{
    Article, ArticleFilter, ArticleMeta, ArticleStore, BotStatsStore, GeneratedFrom,
};
use trendwise::trending::aggregator::rank_topics;
use trendwise::trending::TrendingTopic;

fn config(min: u8, max: usize) -> AutoGenerationConfig {
    AutoGenerationConfig {
        max_articles_per_run: max,
        min_trend_score: min,
        cooldown_hours: 6,
        enabled: true,
    }
}

fn bot_with(
    batch: Vec<TrendingTopic>,
    generator: Arc<RecordingGenerator>,
    store: Arc<MemoryStore>,
    cfg: AutoGenerationConfig,
) -> BackendBot {
    BackendBot::new(
        ScriptedSource::fixed(batch),
        generator,
        store.clone(),
        store,
        cfg,
    )
}

fn stored_article(title: &str) -> Article {
    let now = Utc::now();
    Article {
        title: title.into(),
        slug: trendwise::trending::slugify(title),
        excerpt: String::new(),
        content: "<p>existing</p>".into(),
        author: "Editor".into(),
        tags: vec![],
        category: "Technology".into(),
        published_at: now,
        updated_at: now,
        read_time: 1,
        views: 10,
        featured: false,
        meta: ArticleMeta::default(),
        media: None,
        generated_from: None,
    }
}

#[tokio::test(start_paused = true)]
async fn picks_top_scorers_above_threshold_up_to_cap() {
    let batch = rank_topics(
        vec![
            topic("Alpha", 99),
            topic("Bravo", 90),
            topic("Charlie", 85),
            topic("Delta", 60),
        ],
        15,
    );
    let generator = RecordingGenerator::new();
    let store = Arc::new(MemoryStore::new());
    let bot = bot_with(batch, generator.clone(), store.clone(), config(80, 2));

    let outcome = bot.manual_trigger().await;

    assert_eq!(generator.topics(), vec!["Alpha", "Bravo"]);
    match outcome {
        CycleOutcome::Completed(s) => {
            assert_eq!(s.topics_processed, 4);
            assert_eq!(s.high_score_topics, 3);
            assert_eq!(s.articles_generated, 2);
        }
        other => panic!("expected a completed cycle, got {other:?}"),
    }

    let generated = store
        .find_articles(&ArticleFilter::HasGeneratedFrom, 10)
        .await
        .unwrap();
    assert_eq!(generated.len(), 2);
    let a = generated
        .iter()
        .find(|a| a.title == "Deep Dive: Alpha")
        .expect("alpha article persisted");
    assert_eq!(a.slug, "deep-dive-alpha");
    assert_eq!(a.author, "AI Assistant");
    assert_eq!(a.read_time, 3);
    assert_eq!(
        a.generated_from,
        Some(GeneratedFrom {
            topic: "Alpha".into(),
            source: "Test".into(),
            trend_score: 99,
        })
    );
}

#[tokio::test(start_paused = true)]
async fn existing_article_with_same_title_prefix_is_skipped() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_article(stored_article("the new react compiler: a first look"))
        .await
        .unwrap();

    let generator = RecordingGenerator::new();
    let batch = rank_topics(
        vec![
            topic("The New React Compiler Explained For Everyone", 95),
            topic("Zig Build System", 90),
        ],
        15,
    );
    let bot = bot_with(batch, generator.clone(), store, config(80, 3));
    bot.manual_trigger().await;

    assert_eq!(generator.topics(), vec!["Zig Build System"]);
}

#[tokio::test(start_paused = true)]
async fn second_cycle_skips_topics_it_already_generated() {
    let store = Arc::new(MemoryStore::new());
    let generator = RecordingGenerator::new();
    let batch = rank_topics(vec![topic("Vite 7", 92)], 15);
    let bot = bot_with(batch, generator.clone(), store, config(80, 3));

    bot.manual_trigger().await;
    let second = bot.manual_trigger().await;

    assert_eq!(generator.topics(), vec!["Vite 7"]);
    match second {
        CycleOutcome::Completed(s) => assert_eq!(s.articles_generated, 0),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn manual_trigger_during_a_running_cycle_is_a_noop() {
    let generator = RecordingGenerator::slow(Duration::from_secs(30));
    let store = Arc::new(MemoryStore::new());
    let batch = rank_topics(vec![topic("One", 95), topic("Two", 94)], 15);
    let bot = bot_with(batch, generator.clone(), store, config(80, 2));

    let (first, second) = tokio::join!(bot.manual_trigger(), bot.manual_trigger());

    assert!(matches!(first, CycleOutcome::Completed(_)));
    assert_eq!(second, CycleOutcome::Skipped);
    assert_eq!(generator.topics().len(), 2, "only one cycle's worth of calls");
    assert!(!bot.is_running());
}

#[tokio::test(start_paused = true)]
async fn a_failing_topic_does_not_stop_the_cycle() {
    let generator = RecordingGenerator::failing_for(&["Flaky"]);
    let store = Arc::new(MemoryStore::new());
    let batch = rank_topics(
        vec![topic("Flaky", 99), topic("Solid", 98), topic("Steady", 97)],
        15,
    );
    let bot = bot_with(batch, generator.clone(), store, config(80, 3));

    match bot.manual_trigger().await {
        CycleOutcome::Completed(s) => {
            assert_eq!(s.articles_generated, 2);
            assert!(s.articles_generated <= s.high_score_topics.min(3));
            assert!(s.high_score_topics <= s.topics_processed);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(generator.topics(), vec!["Flaky", "Solid", "Steady"]);
}

#[tokio::test(start_paused = true)]
async fn generation_calls_are_spaced_by_the_delay() {
    let generator = RecordingGenerator::new();
    let store = Arc::new(MemoryStore::new());
    let batch = rank_topics(
        vec![topic("First", 99), topic("Second", 98), topic("Third", 97)],
        15,
    );
    let bot = bot_with(batch, generator, store, config(80, 3))
        .with_generation_delay(Duration::from_secs(2));

    let started = tokio::time::Instant::now();
    bot.manual_trigger().await;
    let elapsed = started.elapsed();
    assert!(
        elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5),
        "two delays between three calls, got {elapsed:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn empty_aggregation_aborts_without_statistics() {
    let generator = RecordingGenerator::new();
    let store = Arc::new(MemoryStore::new());
    let bot = bot_with(Vec::new(), generator.clone(), store.clone(), config(80, 3));

    assert_eq!(bot.manual_trigger().await, CycleOutcome::NoTopics);
    assert!(generator.topics().is_empty());
    assert_eq!(store.stats_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn statistics_are_pruned_to_the_most_recent_hundred() {
    let store = Arc::new(MemoryStore::new());
    let base = Utc::now() - ChronoDuration::days(30);
    for i in 0..(STATS_RETENTION as i64 + 5) {
        store
            .insert_stats(BotRunStatistics {
                timestamp: base + ChronoDuration::minutes(i),
                topics_processed: 1,
                high_score_topics: 0,
                articles_generated: 0,
            })
            .await
            .unwrap();
    }

    let bot = bot_with(
        rank_topics(vec![topic("Low", 10)], 15),
        RecordingGenerator::new(),
        store.clone(),
        config(80, 3),
    );
    bot.manual_trigger().await;

    assert_eq!(store.stats_len(), STATS_RETENTION);
    let latest = store.latest_stats().await.unwrap().unwrap();
    assert_eq!(latest.topics_processed, 1);
    assert_eq!(latest.high_score_topics, 0);
    assert!(latest.timestamp > base + ChronoDuration::minutes(200));
}

#[tokio::test(start_paused = true)]
async fn get_statistics_reports_last_run_and_generated_total() {
    let store = Arc::new(MemoryStore::new());
    store.insert_article(stored_article("Hand written")).await.unwrap();
    let bot = bot_with(
        rank_topics(vec![topic("Astro 5", 91), topic("Qwik", 88)], 15),
        RecordingGenerator::new(),
        store,
        config(80, 3),
    );

    let before = bot.get_statistics().await;
    assert!(before.last_run.is_none());
    assert!(before.last_cycle_stats.is_none());
    assert_eq!(before.total_generated_articles, 0);

    bot.manual_trigger().await;
    let after = bot.get_statistics().await;
    assert!(after.last_run.is_some());
    assert!(!after.is_running);
    assert_eq!(after.total_generated_articles, 2);
    assert_eq!(after.last_cycle_stats.map(|s| s.articles_generated), Some(2));
    assert_eq!(after.config.min_trend_score, 80);
}

#[tokio::test(start_paused = true)]
async fn stop_prevents_future_scheduled_cycles() {
    let generator = RecordingGenerator::new();
    let store = Arc::new(MemoryStore::new());
    let source = ScriptedSource::fixed(Vec::new());
    let bot = Arc::new(
        BackendBot::new(source.clone(), generator, store.clone(), store, config(80, 3))
            .with_cycle_interval(Duration::from_secs(60)),
    );

    bot.start().await;
    assert_eq!(source.calls(), 1, "start runs one cycle immediately");

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(source.calls(), 2, "timer fired once");

    bot.stop();
    assert!(!bot.is_enabled());
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(source.calls(), 2, "no cycles after stop");
    assert!(!bot.get_statistics().await.config.enabled);
}

#[tokio::test(start_paused = true)]
async fn zero_cooldown_is_floored_to_one_minute() {
    let store = Arc::new(MemoryStore::new());
    let source = ScriptedSource::fixed(Vec::new());
    let mut cfg = config(80, 3);
    cfg.cooldown_hours = 0;
    let bot = Arc::new(BackendBot::new(
        source.clone(),
        RecordingGenerator::new(),
        store.clone(),
        store,
        cfg,
    ));
    assert_eq!(bot.cycle_interval(), MIN_CYCLE_INTERVAL);

    bot.start().await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(source.calls(), 1, "no tick before the floor elapses");
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(source.calls(), 2);
    bot.stop();
}

#[tokio::test(start_paused = true)]
async fn restart_reschedules_from_the_new_start() {
    let store = Arc::new(MemoryStore::new());
    let source = ScriptedSource::fixed(Vec::new());
    let bot = Arc::new(
        BackendBot::new(
            source.clone(),
            RecordingGenerator::new(),
            store.clone(),
            store,
            config(80, 3),
        )
        .with_cycle_interval(Duration::from_secs(60)),
    );

    bot.start().await;
    tokio::time::sleep(Duration::from_secs(40)).await;
    bot.stop();
    bot.start().await;
    assert_eq!(source.calls(), 2);

    // the first timer would have fired at 60s
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(source.calls(), 2, "old timer retired");

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(source.calls(), 3, "new timer fires 60s after the restart");

    tokio::time::sleep(Duration::from_secs(18)).await;
    assert_eq!(source.calls(), 3);
    bot.stop();
}

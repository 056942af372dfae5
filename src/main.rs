//! Trendwise service entrypoint.
//! Loads config, wires adapters, cache gateway and bot, and serves the Axum router.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trendwise::config::AppConfig;
use trendwise::metrics::Metrics;

/// Install the subscriber once. `LOG_FORMAT=json` switches to JSON lines.
/// `try_init` tolerates a subscriber already installed by the runtime.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trendwise=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default().context("loading trendwise config")?;
    let metrics = Metrics::init(cfg.trending.cache_ttl())?;
    let state = trendwise::build_state(&cfg).await?;

    if cfg.bot.enabled && cfg.bot.autostart {
        let bot = state.bot.clone();
        tokio::spawn(async move {
            let outcome = bot.start().await;
            tracing::info!(target: "bot", ?outcome, "autostart cycle finished");
        });
    }

    let router = trendwise::create_router(state).merge(metrics.router());
    Ok(router.into())
}

// src/api.rs
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::bot::{BackendBot, BotStatus};
use crate::trending::cache::{BatchOrigin, TrendGateway};
use crate::trending::TrendingTopic;

pub const CACHE_HEADER: &str = "x-trend-cache";
pub const ORIGIN_HEADER: &str = "x-trend-origin";
const SUPPORTED_ACTIONS: &str = "start, trigger, stop, stats";

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<TrendGateway>,
    pub bot: Arc<BackendBot>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/trending", get(get_trending).post(refresh_trending))
        .route("/api/bot", get(bot_stats).post(bot_action))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn get_trending(State(state): State<AppState>) -> Response {
    let batch = state.gateway.get_trending().await;
    let cache = if batch.origin == BatchOrigin::Cache {
        "HIT"
    } else {
        "MISS"
    };
    (
        [(CACHE_HEADER, cache), (ORIGIN_HEADER, batch.origin.as_str())],
        Json(batch.topics),
    )
        .into_response()
}

#[derive(Serialize)]
struct RefreshResp {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    topics: Option<Vec<TrendingTopic>>,
}

async fn refresh_trending(State(state): State<AppState>) -> Response {
    let batch = state.gateway.force_refresh().await;
    if batch.origin == BatchOrigin::Live {
        let body = RefreshResp {
            success: true,
            message: format!(
                "Successfully refreshed {} trending topics",
                batch.topics.len()
            ),
            topics: Some(batch.topics),
        };
        (StatusCode::OK, Json(body)).into_response()
    } else {
        tracing::warn!(target: "trending", origin = batch.origin.as_str(), "manual refresh found no live topics");
        let body = RefreshResp {
            success: false,
            message: "Failed to fetch trending topics".into(),
            topics: None,
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct StatsResp {
    success: bool,
    data: BotStatus,
}

async fn bot_stats(State(state): State<AppState>) -> Json<StatsResp> {
    Json(StatsResp {
        success: true,
        data: state.bot.get_statistics().await,
    })
}

#[derive(Deserialize)]
struct BotActionReq {
    #[serde(default)]
    action: String,
}

async fn bot_action(State(state): State<AppState>, Json(req): Json<BotActionReq>) -> Response {
    let message = match req.action.as_str() {
        "start" => {
            state.bot.start().await;
            "Backend bot started successfully"
        }
        "trigger" => {
            state.bot.manual_trigger().await;
            "Manual generation cycle triggered"
        }
        "stop" => {
            state.bot.stop();
            "Backend bot stopped"
        }
        "stats" => return bot_stats(State(state)).await.into_response(),
        other => {
            tracing::debug!(action = other, "unsupported bot action");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": format!("Invalid action. Supported actions: {SUPPORTED_ACTIONS}"),
                })),
            )
                .into_response();
        }
    };
    Json(json!({ "success": true, "message": message })).into_response()
}

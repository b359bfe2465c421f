//! Health check endpoint
//!
//! Reports uptime, build identity and the processing loop's latest state.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::media::count_media;
use crate::db::SqlRelationalStore;
use crate::workflow::{CycleReport, LoopState};
use crate::AppState;

/// Loop section of the health response
#[derive(Debug, Serialize)]
pub struct ProcessorHealth {
    pub state: LoopState,
    pub cycles_completed: u64,
    pub last_cycle: Option<CycleReport>,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the last cycle reported an error
    pub status: String,
    pub module: String,
    pub version: String,
    pub git_hash: String,
    pub uptime_seconds: u64,
    pub processor: ProcessorHealth,
    /// Rows in the relational `media` table, when the store is reachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let snapshot = state.status.read().await.clone();

    let media_count = match &state.db {
        Some(store) => match count_rows(store).await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!(error = %e, "Health check could not count media rows");
                None
            }
        },
        None => None,
    };

    let status = if snapshot.last_error.is_some() {
        "degraded"
    } else {
        "ok"
    };

    Json(HealthResponse {
        status: status.to_string(),
        module: "jfai-processor".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: state.git_hash.to_string(),
        uptime_seconds,
        processor: ProcessorHealth {
            state: snapshot.state,
            cycles_completed: snapshot.cycles_completed,
            last_cycle: snapshot.last_cycle,
            last_cycle_at: snapshot.last_cycle_at,
        },
        media_count,
        last_error: snapshot.last_error,
    })
}

async fn count_rows(store: &SqlRelationalStore) -> jfai_common::Result<i64> {
    store.ensure_schema().await?;
    count_media(store.pool()).await
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

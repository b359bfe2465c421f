//! jfai-processor library interface
//!
//! Exposes the pipeline components for the binary and integration tests.

pub mod api;
pub mod db;
pub mod dsp;
pub mod error;
pub mod graph;
pub mod services;
pub mod utils;
pub mod workflow;

use axum::Router;
use chrono::{DateTime, Utc};

use crate::db::SqlRelationalStore;
use crate::workflow::SharedStatus;

pub use crate::error::{ApiError, ApiResult};

/// Git commit the binary was built from
pub const GIT_HASH: &str = env!("GIT_HASH");
/// Build time (UTC, RFC 3339)
pub const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");
/// Cargo profile of the build
pub const BUILD_PROFILE: &str = env!("BUILD_PROFILE");

/// State shared with HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Relational store behind the media routes and health row count
    pub db: Option<SqlRelationalStore>,
    /// Status published by the processing loop
    pub status: SharedStatus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    pub git_hash: &'static str,
}

impl AppState {
    pub fn new(db: Option<SqlRelationalStore>, status: SharedStatus) -> Self {
        Self {
            db,
            status,
            startup_time: Utc::now(),
            git_hash: GIT_HASH,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::media_routes())
        .with_state(state)
}

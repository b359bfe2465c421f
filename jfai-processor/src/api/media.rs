//! Read-only views over the relational `media` table
//!
//! - `GET /api/media?page=&limit=&type=`: a page of rows, each with its
//!   analysis rows
//! - `GET /api/media/:id`: one row by generated id, with its analyses

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::media::{count_media_of_type, get_media, list_analyses_for_media, list_media};
use crate::db::{AnalysisRecord, MediaRecord, SqlRelationalStore};
use crate::{ApiError, ApiResult, AppState};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
}

/// A media row with its analyses
#[derive(Debug, Serialize)]
pub struct MediaWithAnalyses {
    #[serde(flatten)]
    pub media: MediaRecord,
    pub media_analysis: Vec<AnalysisRecord>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    /// Rows matching the filter across all pages
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct MediaPage {
    pub data: Vec<MediaWithAnalyses>,
    pub pagination: Pagination,
}

async fn store(state: &AppState) -> ApiResult<&SqlRelationalStore> {
    let store = state.db.as_ref().ok_or(ApiError::StoreUnavailable)?;
    store.ensure_schema().await?;
    Ok(store)
}

async fn with_analyses(store: &SqlRelationalStore, media: MediaRecord) -> ApiResult<MediaWithAnalyses> {
    let media_analysis = list_analyses_for_media(store.pool(), &media.id).await?;
    Ok(MediaWithAnalyses {
        media,
        media_analysis,
    })
}

/// GET /api/media
pub async fn list_media_handler(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
) -> ApiResult<Json<MediaPage>> {
    let page = query.page.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::BadRequest("page starts at 1".to_string()));
    }
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    let store = store(&state).await?;
    let item_type = query.item_type.as_deref().filter(|t| !t.is_empty());
    let offset = i64::from(page - 1) * i64::from(limit);

    let rows = list_media(store.pool(), item_type, i64::from(limit), offset).await?;
    let total = count_media_of_type(store.pool(), item_type).await?;

    let mut data = Vec::with_capacity(rows.len());
    for media in rows {
        data.push(with_analyses(store, media).await?);
    }

    Ok(Json(MediaPage {
        data,
        pagination: Pagination { page, limit, total },
    }))
}

/// GET /api/media/:id
pub async fn get_media_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MediaWithAnalyses>> {
    let store = store(&state).await?;
    let media = get_media(store.pool(), &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("media {}", id)))?;

    Ok(Json(with_analyses(store, media).await?))
}

pub fn media_routes() -> Router<AppState> {
    Router::new()
        .route("/api/media", get(list_media_handler))
        .route("/api/media/:id", get(get_media_handler))
}

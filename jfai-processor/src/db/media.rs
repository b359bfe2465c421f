//! `media` and `media_analysis` rows

use chrono::Utc;
use jfai_common::{AnalysisResult, AudioFeatures, MediaItem, Result};
use serde::Serialize;
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};
use uuid::Uuid;

/// Status written on analysis rows created by the processor
pub const STATUS_COMPLETED: &str = "completed";

/// One `media` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaRecord {
    pub id: String,
    pub jellyfin_id: String,
    pub name: String,
    pub path: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub duration: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// One `media_analysis` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub media_id: String,
    pub ai_description: Option<String>,
    pub ai_analysis: Option<String>,
    pub audio_features: Option<String>,
    pub processing_status: String,
    pub created_at: String,
}

/// Insert or update the row keyed by the server item id
///
/// Returns the row's generated id, which stays the same across upserts.
pub async fn upsert_media(pool: &AnyPool, item: &MediaItem, duration: f64) -> Result<String> {
    let now = Utc::now().to_rfc3339();

    let row = sqlx::query(
        r#"
        INSERT INTO media (id, jellyfin_id, name, path, type, duration, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (jellyfin_id) DO UPDATE SET
            name = excluded.name,
            path = excluded.path,
            type = excluded.type,
            duration = excluded.duration,
            updated_at = excluded.updated_at
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&item.id)
    .bind(&item.name)
    .bind(&item.path)
    .bind(&item.item_type)
    .bind(duration)
    .bind(&now)
    .bind(&now)
    .fetch_one(pool)
    .await?;

    Ok(row.try_get("id")?)
}

/// Append an analysis row for `media_id`
///
/// Never updates: each processing pass adds a row.
pub async fn insert_analysis(
    pool: &AnyPool,
    media_id: &str,
    analysis: &AnalysisResult,
    features: Option<&AudioFeatures>,
) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    let features_json = features
        .map(AudioFeatures::to_json)
        .unwrap_or_else(|| serde_json::json!({}))
        .to_string();

    sqlx::query(
        r#"
        INSERT INTO media_analysis
            (id, media_id, ai_description, ai_analysis, audio_features, processing_status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(&id)
    .bind(media_id)
    .bind(analysis.description_or_empty())
    .bind(analysis.payload.to_string())
    .bind(features_json)
    .bind(STATUS_COMPLETED)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn count_media(pool: &AnyPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS total FROM media")
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("total")?)
}

const MEDIA_COLUMNS: &str = "id, jellyfin_id, name, path, type, duration, created_at, updated_at";

fn media_from_row(row: &AnyRow) -> Result<MediaRecord> {
    Ok(MediaRecord {
        id: row.try_get("id")?,
        jellyfin_id: row.try_get("jellyfin_id")?,
        name: row.try_get("name")?,
        path: row.try_get("path")?,
        item_type: row.try_get("type")?,
        duration: row.try_get("duration")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn get_media_by_jellyfin_id(
    pool: &AnyPool,
    jellyfin_id: &str,
) -> Result<Option<MediaRecord>> {
    let row = sqlx::query(&format!("SELECT {MEDIA_COLUMNS} FROM media WHERE jellyfin_id = $1"))
        .bind(jellyfin_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(media_from_row).transpose()
}

/// Look up a row by its generated id
pub async fn get_media(pool: &AnyPool, id: &str) -> Result<Option<MediaRecord>> {
    let row = sqlx::query(&format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(media_from_row).transpose()
}

/// One page of media rows in insertion order, optionally of one item type
pub async fn list_media(
    pool: &AnyPool,
    item_type: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<MediaRecord>> {
    let rows = match item_type {
        Some(item_type) => {
            sqlx::query(&format!(
                "SELECT {MEDIA_COLUMNS} FROM media WHERE type = $1 \
                 ORDER BY created_at, id LIMIT $2 OFFSET $3"
            ))
            .bind(item_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "SELECT {MEDIA_COLUMNS} FROM media ORDER BY created_at, id LIMIT $1 OFFSET $2"
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(media_from_row).collect()
}

/// Rows matching the `list_media` filter
pub async fn count_media_of_type(pool: &AnyPool, item_type: Option<&str>) -> Result<i64> {
    let Some(item_type) = item_type else {
        return count_media(pool).await;
    };
    let row = sqlx::query("SELECT COUNT(*) AS total FROM media WHERE type = $1")
        .bind(item_type)
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("total")?)
}

pub async fn list_analyses_for_media(pool: &AnyPool, media_id: &str) -> Result<Vec<AnalysisRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, media_id, ai_description, ai_analysis, audio_features, processing_status, created_at
        FROM media_analysis
        WHERE media_id = $1
        ORDER BY created_at
        "#,
    )
    .bind(media_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| -> Result<AnalysisRecord> {
            Ok(AnalysisRecord {
                id: row.try_get("id")?,
                media_id: row.try_get("media_id")?,
                ai_description: row.try_get("ai_description")?,
                ai_analysis: row.try_get("ai_analysis")?,
                audio_features: row.try_get("audio_features")?,
                processing_status: row.try_get("processing_status")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}

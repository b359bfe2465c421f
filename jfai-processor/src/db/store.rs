//! Trait seam over the relational store

use super::{init_tables, media};
use jfai_common::{AnalysisResult, AudioFeatures, MediaItem, Result};
use sqlx::AnyPool;
use std::sync::Arc;
use tokio::sync::OnceCell;

#[async_trait::async_trait]
pub trait RelationalStore: Send + Sync {
    /// Upsert the media row, returning its generated id
    async fn upsert_media(&self, item: &MediaItem, duration: f64) -> Result<String>;

    /// Insert a new analysis row for an existing media row
    async fn insert_analysis(
        &self,
        media_id: &str,
        analysis: &AnalysisResult,
        features: Option<&AudioFeatures>,
    ) -> Result<String>;
}

/// sqlx-backed store
///
/// Works over a lazy pool: tables are created before the first query that
/// succeeds in reaching the database, and creation is retried on the next
/// call if it fails. Clones share that state.
#[derive(Clone)]
pub struct SqlRelationalStore {
    pool: AnyPool,
    schema: Arc<OnceCell<()>>,
}

impl SqlRelationalStore {
    pub fn new(pool: AnyPool) -> Self {
        Self {
            pool,
            schema: Arc::new(OnceCell::new()),
        }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Create tables once per store
    pub async fn ensure_schema(&self) -> Result<()> {
        self.schema
            .get_or_try_init(|| init_tables(&self.pool))
            .await?;
        Ok(())
    }

    pub fn schema_ready(&self) -> bool {
        self.schema.initialized()
    }
}

#[async_trait::async_trait]
impl RelationalStore for SqlRelationalStore {
    async fn upsert_media(&self, item: &MediaItem, duration: f64) -> Result<String> {
        self.ensure_schema().await?;
        media::upsert_media(&self.pool, item, duration).await
    }

    async fn insert_analysis(
        &self,
        media_id: &str,
        analysis: &AnalysisResult,
        features: Option<&AudioFeatures>,
    ) -> Result<String> {
        self.ensure_schema().await?;
        media::insert_analysis(&self.pool, media_id, analysis, features).await
    }
}

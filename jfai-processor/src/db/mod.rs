//! Relational store access
//!
//! Uses the sqlx `Any` driver: PostgreSQL in deployment, SQLite for local
//! runs and tests. Queries stick to the SQL both dialects accept.

pub mod media;
pub mod store;

pub use media::{AnalysisRecord, MediaRecord};
pub use store::{RelationalStore, SqlRelationalStore};

use jfai_common::Result;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;

const MAX_CONNECTIONS: u32 = 5;

/// Pool options for `database_url`
///
/// Every connection to an in-memory SQLite URL is a separate database, so
/// those pools hold exactly one connection and never recycle it.
fn pool_options(database_url: &str) -> AnyPoolOptions {
    sqlx::any::install_default_drivers();

    if database_url.contains(":memory:") {
        AnyPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        AnyPoolOptions::new().max_connections(MAX_CONNECTIONS)
    }
}

/// Connect and create tables if they don't exist
pub async fn init_database_pool(database_url: &str) -> Result<AnyPool> {
    tracing::debug!("Connecting to relational store");

    let pool = pool_options(database_url).connect(database_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Pool that connects on first use
///
/// Only the URL is checked here. Tables are created by the store before its
/// first query (`SqlRelationalStore::ensure_schema`).
pub fn lazy_database_pool(database_url: &str) -> Result<AnyPool> {
    Ok(pool_options(database_url).connect_lazy(database_url)?)
}

/// Create `media` and `media_analysis`
pub async fn init_tables(pool: &AnyPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media (
            id TEXT PRIMARY KEY,
            jellyfin_id TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            path TEXT,
            type TEXT,
            duration DOUBLE PRECISION,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media_analysis (
            id TEXT PRIMARY KEY,
            media_id TEXT NOT NULL REFERENCES media(id) ON DELETE CASCADE,
            ai_description TEXT,
            ai_analysis TEXT,
            audio_features TEXT,
            processing_status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_media_analysis_media_id ON media_analysis(media_id)")
        .execute(pool)
        .await?;

    tracing::info!("Database tables initialized (media, media_analysis)");

    Ok(())
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> AnyPool {
    init_database_pool("sqlite::memory:").await.unwrap()
}

//! Processed-item markers in Redis
//!
//! Key `processed:<id>`, value "1", expiring after the configured TTL.
//! A marker only saves work; losing one means the item is reprocessed.

use jfai_common::models::processed_key;
use redis::aio::ConnectionManager;
use redis::Cmd;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Cache command failed: {0}")]
    Command(#[from] redis::RedisError),
}

/// Records which item ids were already processed
#[async_trait::async_trait]
pub trait DedupCache: Send + Sync {
    async fn has(&self, item_id: &str) -> Result<bool, CacheError>;

    async fn mark(&self, item_id: &str, ttl: Duration) -> Result<(), CacheError>;
}

/// Redis-backed markers over a reconnecting connection manager
///
/// The connection is opened by the first command. A failed attempt is
/// reported as `CacheError::Connection` and retried by the next command.
#[derive(Clone)]
pub struct RedisDedupCache {
    client: redis::Client,
    connection: std::sync::Arc<OnceCell<ConnectionManager>>,
}

impl RedisDedupCache {
    /// Validate the URL without connecting; clones share one connection
    pub fn new(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            connection: Default::default(),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new(self.client.clone())
                    .await
                    .map_err(|e| CacheError::Connection(e.to_string()))?;
                tracing::info!("Connected to dedup cache");
                Ok::<_, CacheError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }
}

/// `EXISTS processed:<id>`
fn exists_command(item_id: &str) -> Cmd {
    let mut cmd = redis::cmd("EXISTS");
    cmd.arg(processed_key(item_id));
    cmd
}

/// `SET processed:<id> 1 EX <seconds>`, at least one second
fn mark_command(item_id: &str, ttl: Duration) -> Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(processed_key(item_id))
        .arg("1")
        .arg("EX")
        .arg(ttl.as_secs().max(1));
    cmd
}

#[async_trait::async_trait]
impl DedupCache for RedisDedupCache {
    async fn has(&self, item_id: &str) -> Result<bool, CacheError> {
        let mut conn = self.connection().await?;
        let exists: bool = exists_command(item_id).query_async(&mut conn).await?;
        Ok(exists)
    }

    async fn mark(&self, item_id: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = mark_command(item_id, ttl).query_async(&mut conn).await?;
        Ok(())
    }
}

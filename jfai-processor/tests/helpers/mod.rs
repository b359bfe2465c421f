//! Shared test utilities for jfai-processor

#![allow(dead_code)]

pub mod audio_generator;
pub mod fakes;
pub mod log_capture;
pub mod mock_server;

pub use audio_generator::{generate_test_wav, AudioConfig};
pub use fakes::*;
pub use log_capture::LogCapture;
pub use mock_server::spawn_mock;

use jfai_processor::db::{init_database_pool, SqlRelationalStore};
use sqlx::AnyPool;

/// Fresh in-memory relational store
pub async fn memory_store() -> (AnyPool, SqlRelationalStore) {
    let pool = init_database_pool("sqlite::memory:")
        .await
        .expect("in-memory database");
    (pool.clone(), SqlRelationalStore::new(pool))
}

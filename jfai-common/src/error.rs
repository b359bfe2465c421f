//! Common error types for jfai

use thiserror::Error;

/// Common result type for jfai operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared across the jfai crates
///
/// Upstream services report through their own error enums in
/// `jfai-processor::services` and `jfai-processor::graph`.
#[derive(Error, Debug)]
pub enum Error {
    /// Relational store error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

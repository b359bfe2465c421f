//! # jfai Common Library
//!
//! Shared code for the jfai media processor:
//! - Data model (media items, audio features, analysis results)
//! - Error types
//! - Layered configuration loading
//! - Logging setup

pub mod config;
pub mod error;
pub mod logging;
pub mod models;

pub use config::ProcessorConfig;
pub use error::{Error, Result};
pub use models::{AnalysisResult, AudioFeatures, MediaItem};

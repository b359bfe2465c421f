//! External service adapters
//!
//! Each adapter sits behind a trait so the processing loop can be driven by
//! fakes in tests.

pub mod dedup_cache;
pub mod feature_extractor;
pub mod jellyfin_client;
pub mod qwen_client;

pub use dedup_cache::{CacheError, DedupCache, RedisDedupCache};
pub use feature_extractor::{FeatureError, FeatureExtractor, SpectralFeatureExtractor};
pub use jellyfin_client::{JellyfinClient, LibraryError, LibrarySource};
pub use qwen_client::{AnalyzerError, AudioAnalyzer, QwenAudioClient};

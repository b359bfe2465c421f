//! In-memory implementations of the pipeline's trait seams

use jfai_common::{AnalysisResult, AudioFeatures, MediaItem, Result as CommonResult};
use jfai_processor::db::RelationalStore;
use jfai_processor::graph::{GraphError, GraphStore};
use jfai_processor::services::{
    AnalyzerError, AudioAnalyzer, CacheError, DedupCache, FeatureError, FeatureExtractor,
    LibraryError, LibrarySource,
};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub fn sample_features() -> AudioFeatures {
    AudioFeatures {
        tempo: 120.0,
        duration: 180.0,
        mfcc_mean: vec![-200.0, 80.0, -10.0, 20.0, -5.0, 8.0, -3.0, 4.0, -2.0, 1.0, 0.5, -0.5, 0.2],
        spectral_centroid_mean: 1800.0,
        spectral_rolloff_mean: 3600.0,
        zero_crossing_rate_mean: 0.06,
        sample_rate: 22050,
    }
}

pub fn sample_analysis() -> AnalysisResult {
    AnalysisResult::from_payload(json!({ "description": "upbeat pop track", "confidence": 0.9 }))
        .expect("non-empty payload")
}

// ----- Library -----

#[derive(Default)]
pub struct FakeLibrary {
    items: Mutex<Vec<MediaItem>>,
    fail: AtomicBool,
    panic_once: AtomicBool,
    listed_at: Mutex<Vec<Instant>>,
}

impl FakeLibrary {
    pub fn with_items(items: Vec<MediaItem>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        let library = Self::default();
        library.fail.store(true, Ordering::SeqCst);
        library
    }

    /// Panics inside the first listing, then lists `items`
    pub fn panicking_once(items: Vec<MediaItem>) -> Self {
        let library = Self::with_items(items);
        library.panic_once.store(true, Ordering::SeqCst);
        library
    }

    /// Times at which a listing started
    pub fn listed_at(&self) -> Vec<Instant> {
        self.listed_at.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LibrarySource for FakeLibrary {
    async fn list_audio_items(&self) -> Result<Vec<MediaItem>, LibraryError> {
        self.listed_at.lock().unwrap().push(Instant::now());
        if self.panic_once.swap(false, Ordering::SeqCst) {
            panic!("library response handler bug");
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(LibraryError::Status {
                stage: "authentication",
                status: 401,
            });
        }
        Ok(self.items.lock().unwrap().clone())
    }
}

// ----- Feature extractor -----

pub struct FakeExtractor {
    features: Option<AudioFeatures>,
    /// File stem that makes `extract` panic
    panic_on: Option<String>,
    calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn returning(features: AudioFeatures) -> Self {
        Self {
            features: Some(features),
            panic_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            features: None,
            panic_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns `features`, except for files named `<stem>.*`, where it panics
    pub fn panicking_on(stem: &str, features: AudioFeatures) -> Self {
        Self {
            features: Some(features),
            panic_on: Some(stem.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FeatureExtractor for FakeExtractor {
    fn extract(&self, path: &Path) -> Result<AudioFeatures, FeatureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let stem = path.file_stem().and_then(|s| s.to_str());
        if stem.is_some() && stem == self.panic_on.as_deref() {
            panic!("index out of bounds in frame decoder");
        }
        self.features
            .clone()
            .ok_or_else(|| FeatureError::Decode(format!("cannot decode {}", path.display())))
    }
}

// ----- Analyzer -----

pub enum AnalyzerBehavior {
    Respond(AnalysisResult),
    Empty,
    Fail,
    /// Never answers within any reasonable test time
    Hang,
}

pub struct FakeAnalyzer {
    behavior: AnalyzerBehavior,
    calls: Mutex<Vec<PathBuf>>,
}

impl FakeAnalyzer {
    pub fn new(behavior: AnalyzerBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl AudioAnalyzer for FakeAnalyzer {
    async fn analyze(&self, path: &Path) -> Result<Option<AnalysisResult>, AnalyzerError> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        match &self.behavior {
            AnalyzerBehavior::Respond(result) => Ok(Some(result.clone())),
            AnalyzerBehavior::Empty => Ok(None),
            AnalyzerBehavior::Fail => Err(AnalyzerError::Api(503, "model loading".to_string())),
            AnalyzerBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(AnalyzerError::Timeout)
            }
        }
    }
}

// ----- Dedup cache -----

#[derive(Default)]
pub struct MemoryDedupCache {
    marked: Mutex<HashMap<String, Duration>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryDedupCache {
    pub fn with_marked(ids: &[&str]) -> Self {
        let cache = Self::default();
        {
            let mut marked = cache.marked.lock().unwrap();
            for id in ids {
                marked.insert(id.to_string(), Duration::from_secs(86_400));
            }
        }
        cache
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// TTL of the marker for `id`, if set
    pub fn ttl_of(&self, id: &str) -> Option<Duration> {
        self.marked.lock().unwrap().get(id).copied()
    }
}

#[async_trait::async_trait]
impl DedupCache for MemoryDedupCache {
    async fn has(&self, item_id: &str) -> Result<bool, CacheError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Connection("connection refused".to_string()));
        }
        Ok(self.marked.lock().unwrap().contains_key(item_id))
    }

    async fn mark(&self, item_id: &str, ttl: Duration) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Connection("connection refused".to_string()));
        }
        self.marked.lock().unwrap().insert(item_id.to_string(), ttl);
        Ok(())
    }
}

// ----- Graph store -----

/// Nodes keyed like the Cypher MERGE keys
#[derive(Default)]
pub struct GraphState {
    pub media: HashMap<String, (MediaItem, f64)>,
    pub analysis: HashMap<String, String>,
    pub features: HashMap<String, AudioFeatures>,
    pub has_analysis: HashSet<String>,
    pub has_features: HashSet<String>,
}

#[derive(Default)]
pub struct MemoryGraphStore {
    pub state: Mutex<GraphState>,
    fail: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryGraphStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail.store(true, Ordering::SeqCst);
        store
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), GraphError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(GraphError::Network("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl GraphStore for MemoryGraphStore {
    async fn upsert_media(&self, item: &MediaItem, duration: f64) -> Result<(), GraphError> {
        self.check()?;
        self.state
            .lock()
            .unwrap()
            .media
            .insert(item.id.clone(), (item.clone(), duration));
        Ok(())
    }

    async fn upsert_analysis(
        &self,
        media_id: &str,
        analysis: &AnalysisResult,
    ) -> Result<(), GraphError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        // MATCH on a missing media node writes nothing
        if state.media.contains_key(media_id) {
            state
                .analysis
                .insert(media_id.to_string(), analysis.description_or_empty().to_string());
            state.has_analysis.insert(media_id.to_string());
        }
        Ok(())
    }

    async fn upsert_features(
        &self,
        media_id: &str,
        features: &AudioFeatures,
    ) -> Result<(), GraphError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if state.media.contains_key(media_id) {
            state.features.insert(media_id.to_string(), features.clone());
            state.has_features.insert(media_id.to_string());
        }
        Ok(())
    }
}

// ----- Relational store -----

/// Relational store that rejects every write
#[derive(Default)]
pub struct FailingRelationalStore {
    attempts: AtomicUsize,
}

impl FailingRelationalStore {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RelationalStore for FailingRelationalStore {
    async fn upsert_media(&self, _item: &MediaItem, _duration: f64) -> CommonResult<String> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn insert_analysis(
        &self,
        _media_id: &str,
        _analysis: &AnalysisResult,
        _features: Option<&AudioFeatures>,
    ) -> CommonResult<String> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(sqlx::Error::PoolTimedOut.into())
    }
}

/// Relational store held in memory (upsert by item id, append-only analyses)
#[derive(Default)]
pub struct MemoryRelationalStore {
    pub media: Mutex<HashMap<String, String>>,
    pub analyses: Mutex<Vec<(String, Option<AudioFeatures>)>>,
}

#[async_trait::async_trait]
impl RelationalStore for MemoryRelationalStore {
    async fn upsert_media(&self, item: &MediaItem, _duration: f64) -> CommonResult<String> {
        let mut media = self.media.lock().unwrap();
        let next = format!("row-{}", media.len() + 1);
        Ok(media.entry(item.id.clone()).or_insert(next).clone())
    }

    async fn insert_analysis(
        &self,
        media_id: &str,
        _analysis: &AnalysisResult,
        features: Option<&AudioFeatures>,
    ) -> CommonResult<String> {
        let mut analyses = self.analyses.lock().unwrap();
        analyses.push((media_id.to_string(), features.cloned()));
        Ok(format!("analysis-{}", analyses.len()))
    }
}

//! Media processing loop
//!
//! Alternates between two states:
//! - **Scanning**: list the library, then run the per-item pipeline on each
//!   item in order with a fixed pause between items
//! - **Idle**: wait `interval`, measured from the end of the scan
//!
//! Per item: path check → dedup check → feature extraction → AI analysis →
//! dual write → dedup mark. Component failures degrade the item instead of
//! failing it; the marker is set once both writes were attempted, so a crash
//! mid-pipeline leaves the item eligible for the next cycle.
//!
//! Every wait and every pipeline run races the cancellation token.
//! Scans run in their own task so a panic ends only that scan.

use super::dual_writer::{DualWriteReport, DualWriter};
use super::status::{shared_status, LoopState, SharedStatus};
use crate::db::RelationalStore;
use crate::graph::GraphStore;
use crate::services::{AudioAnalyzer, DedupCache, FeatureExtractor, LibrarySource};
use chrono::Utc;
use jfai_common::config::ProcessorConfig;
use jfai_common::{AnalysisResult, AudioFeatures, MediaItem};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processing cancelled")]
    Cancelled,

    /// The cycle task panicked; the loop backs off and retries
    #[error("Processing cycle aborted: {0}")]
    CycleAborted(String),
}

/// Injected component handles
#[derive(Clone)]
pub struct ProcessorDeps {
    pub library: Arc<dyn LibrarySource>,
    pub extractor: Arc<dyn FeatureExtractor>,
    pub analyzer: Arc<dyn AudioAnalyzer>,
    pub cache: Arc<dyn DedupCache>,
    pub graph: Arc<dyn GraphStore>,
    pub relational: Arc<dyn RelationalStore>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorSettings {
    pub interval: Duration,
    pub item_delay: Duration,
    pub error_backoff: Duration,
    pub dedup_ttl: Duration,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self::from_config(&ProcessorConfig::default())
    }
}

impl ProcessorSettings {
    pub fn from_config(config: &ProcessorConfig) -> Self {
        Self {
            interval: config.schedule.interval(),
            item_delay: config.schedule.item_delay(),
            error_backoff: config.schedule.error_backoff(),
            dedup_ttl: Duration::from_secs(config.cache.ttl_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Path empty or not present on disk
    MissingFile,
    /// Dedup marker present
    AlreadyProcessed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Degraded(String),
}

impl StageStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, StageStatus::Degraded(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub features: StageStatus,
    pub analysis: StageStatus,
    pub writes: DualWriteReport,
    /// Dedup marker was set
    pub marked: bool,
}

impl ItemReport {
    /// Any stage degraded or any store write failed
    pub fn is_degraded(&self) -> bool {
        self.features.is_degraded() || self.analysis.is_degraded() || !self.writes.all_written()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Skipped(SkipReason),
    Processed(ItemReport),
}

/// Counts for one scan
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    pub items_listed: usize,
    pub processed: usize,
    pub skipped_existing: usize,
    pub skipped_missing: usize,
    /// Processed items with at least one degraded stage or failed write
    pub degraded: usize,
    /// Listing failure, if the library could not be read this cycle
    pub listing_error: Option<String>,
    pub elapsed_ms: u64,
}

impl CycleReport {
    fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Skipped(SkipReason::AlreadyProcessed) => self.skipped_existing += 1,
            ItemOutcome::Skipped(SkipReason::MissingFile) => self.skipped_missing += 1,
            ItemOutcome::Processed(report) => {
                self.processed += 1;
                if report.is_degraded() {
                    self.degraded += 1;
                }
            }
        }
    }
}

pub struct MediaProcessor {
    deps: ProcessorDeps,
    settings: ProcessorSettings,
    writer: DualWriter,
    status: SharedStatus,
}

impl MediaProcessor {
    pub fn new(deps: ProcessorDeps, settings: ProcessorSettings) -> Self {
        let writer = DualWriter::new(deps.graph.clone(), deps.relational.clone());
        Self {
            deps,
            settings,
            writer,
            status: shared_status(),
        }
    }

    /// Handle to the status this processor publishes
    pub fn status(&self) -> SharedStatus {
        self.status.clone()
    }

    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    /// Run scans until `cancel` fires
    ///
    /// Each scan runs in its own task. Per-item failures never end a scan, so
    /// the only cycle-level failure is a panic escaping it: that is logged,
    /// recorded in the status, and followed by `error_backoff` instead of
    /// `interval`.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(
            interval_secs = self.settings.interval.as_secs(),
            item_delay_ms = self.settings.item_delay.as_millis() as u64,
            "Media processor started"
        );

        loop {
            let cycle = tokio::spawn({
                let processor = self.clone();
                let cancel = cancel.clone();
                async move { processor.run_once(&cancel).await }
            });

            let result = match cycle.await {
                Ok(result) => result,
                Err(e) => {
                    let failure = ProcessorError::CycleAborted(join_failure(e));
                    self.record_failure(&failure).await;
                    Err(failure)
                }
            };

            let wait = match result {
                Ok(_) => self.settings.interval,
                Err(ProcessorError::Cancelled) => break,
                Err(e) => {
                    error!(error = %e, backoff_secs = self.settings.error_backoff.as_secs(), "Processing cycle failed");
                    self.settings.error_backoff
                }
            };

            self.set_state(LoopState::Idle).await;

            if !sleep_or_cancel(wait, &cancel).await {
                break;
            }
        }

        self.set_state(LoopState::Stopped).await;
        info!("Media processor stopped");
    }

    /// One scan with status bookkeeping and a summary log line
    pub async fn run_once(&self, cancel: &CancellationToken) -> Result<CycleReport, ProcessorError> {
        self.set_state(LoopState::Scanning).await;

        let result = self.run_cycle(cancel).await;

        match &result {
            Ok(report) => {
                info!(
                    listed = report.items_listed,
                    processed = report.processed,
                    skipped_existing = report.skipped_existing,
                    skipped_missing = report.skipped_missing,
                    degraded = report.degraded,
                    elapsed_ms = report.elapsed_ms,
                    "Processing cycle complete"
                );
                let mut status = self.status.write().await;
                status.cycles_completed += 1;
                status.last_cycle = Some(report.clone());
                status.last_cycle_at = Some(Utc::now());
                status.last_error = report.listing_error.clone();
            }
            Err(ProcessorError::Cancelled) => {}
            Err(e) => self.record_failure(e).await,
        }

        result
    }

    async fn record_failure(&self, failure: &ProcessorError) {
        let mut status = self.status.write().await;
        status.last_error = Some(failure.to_string());
        status.last_cycle_at = Some(Utc::now());
    }

    /// List the library and process every item
    ///
    /// A listing failure yields an empty cycle, not an error.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport, ProcessorError> {
        let started = Instant::now();
        let mut report = CycleReport::default();

        let listing = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ProcessorError::Cancelled),
            listing = self.deps.library.list_audio_items() => listing,
        };

        let items = match listing {
            Ok(items) => items,
            Err(e) => {
                error!(error = %e, "Failed to list library items");
                report.listing_error = Some(e.to_string());
                Vec::new()
            }
        };

        report.items_listed = items.len();
        info!(count = items.len(), "Found audio items");

        for (index, item) in items.iter().enumerate() {
            if index > 0 && !sleep_or_cancel(self.settings.item_delay, cancel).await {
                return Err(ProcessorError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ProcessorError::Cancelled),
                outcome = self.process_item(item) => outcome?,
            };

            report.record(&outcome);
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        Ok(report)
    }

    /// Run the pipeline for one item
    pub async fn process_item(&self, item: &MediaItem) -> Result<ItemOutcome, ProcessorError> {
        if item.path.is_empty() || tokio::fs::metadata(&item.path).await.is_err() {
            warn!(item_id = %item.id, name = %item.display_name(), path = %item.path, "File not found, skipping");
            return Ok(ItemOutcome::Skipped(SkipReason::MissingFile));
        }

        match self.deps.cache.has(&item.id).await {
            Ok(true) => {
                info!(item_id = %item.id, name = %item.display_name(), "Already processed, skipping");
                return Ok(ItemOutcome::Skipped(SkipReason::AlreadyProcessed));
            }
            Ok(false) => {}
            Err(e) => {
                warn!(item_id = %item.id, error = %e, "Dedup check failed, processing anyway");
            }
        }

        info!(item_id = %item.id, name = %item.display_name(), "Processing item");

        let path = PathBuf::from(&item.path);

        let (features, features_status) = match self.extract_features(&path).await {
            Ok(features) => (Some(features), StageStatus::Success),
            Err(reason) => {
                warn!(item_id = %item.id, error = %reason, "Feature extraction failed, continuing without features");
                (None, StageStatus::Degraded(reason))
            }
        };

        let (analysis, analysis_status) = self.analyze(item, &path).await;

        let writes = self
            .writer
            .write(item, analysis.as_ref(), features.as_ref())
            .await;

        let marked = match self.deps.cache.mark(&item.id, self.settings.dedup_ttl).await {
            Ok(()) => true,
            Err(e) => {
                warn!(item_id = %item.id, error = %e, "Failed to set dedup marker");
                false
            }
        };

        debug!(item_id = %item.id, graph = ?writes.graph, relational = ?writes.relational, "Item written");
        info!(item_id = %item.id, name = %item.display_name(), "Successfully processed item");

        Ok(ItemOutcome::Processed(ItemReport {
            features: features_status,
            analysis: analysis_status,
            writes,
            marked,
        }))
    }

    /// Feature extraction on the blocking pool
    ///
    /// A panicking extractor is reported like any other extraction failure.
    async fn extract_features(&self, path: &Path) -> Result<AudioFeatures, String> {
        let extractor = self.deps.extractor.clone();
        let path = path.to_path_buf();

        match tokio::task::spawn_blocking(move || extractor.extract(&path)).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(e) => Err(format!("extraction task failed: {}", join_failure(e))),
        }
    }

    async fn analyze(&self, item: &MediaItem, path: &Path) -> (Option<AnalysisResult>, StageStatus) {
        match self.deps.analyzer.analyze(path).await {
            Ok(Some(analysis)) => (Some(analysis), StageStatus::Success),
            Ok(None) => {
                warn!(item_id = %item.id, "Analyzer returned no content");
                (None, StageStatus::Degraded("empty analyzer response".to_string()))
            }
            Err(e) => {
                warn!(item_id = %item.id, error = %e, "AI analysis failed, continuing without analysis");
                (None, StageStatus::Degraded(e.to_string()))
            }
        }
    }

    async fn set_state(&self, state: LoopState) {
        self.status.write().await.state = state;
    }
}

/// Panic message of a failed task, or the join error itself
fn join_failure(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

/// Sleep unless cancelled first; false when cancelled
async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

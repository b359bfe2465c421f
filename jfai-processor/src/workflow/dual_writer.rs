//! Writes one processed item to the graph store and the relational store
//!
//! The two writes are independent and not atomic: a failure in one store is
//! recorded and logged, and the other store is still attempted. Nothing here
//! fails the item.

use crate::db::RelationalStore;
use crate::graph::GraphStore;
use jfai_common::{AnalysisResult, AudioFeatures, MediaItem};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one store's write
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum WriteStatus {
    Written,
    Failed(String),
}

impl WriteStatus {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteStatus::Written)
    }
}

/// Per-store results of a dual write
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DualWriteReport {
    pub graph: WriteStatus,
    pub relational: WriteStatus,
}

impl DualWriteReport {
    pub fn all_written(&self) -> bool {
        self.graph.is_written() && self.relational.is_written()
    }
}

pub struct DualWriter {
    graph: Arc<dyn GraphStore>,
    relational: Arc<dyn RelationalStore>,
}

impl DualWriter {
    pub fn new(graph: Arc<dyn GraphStore>, relational: Arc<dyn RelationalStore>) -> Self {
        Self { graph, relational }
    }

    pub async fn write(
        &self,
        item: &MediaItem,
        analysis: Option<&AnalysisResult>,
        features: Option<&AudioFeatures>,
    ) -> DualWriteReport {
        let duration = features.map(|f| f.duration).unwrap_or(0.0);

        let graph = match self.write_graph(item, duration, analysis, features).await {
            Ok(()) => WriteStatus::Written,
            Err(e) => {
                tracing::error!(item_id = %item.id, name = %item.display_name(), error = %e, "Graph store write failed");
                WriteStatus::Failed(e)
            }
        };

        let relational = match self.write_relational(item, duration, analysis, features).await {
            Ok(()) => WriteStatus::Written,
            Err(e) => {
                tracing::error!(item_id = %item.id, name = %item.display_name(), error = %e, "Relational store write failed");
                WriteStatus::Failed(e)
            }
        };

        DualWriteReport { graph, relational }
    }

    async fn write_graph(
        &self,
        item: &MediaItem,
        duration: f64,
        analysis: Option<&AnalysisResult>,
        features: Option<&AudioFeatures>,
    ) -> Result<(), String> {
        self.graph
            .upsert_media(item, duration)
            .await
            .map_err(|e| format!("media node: {}", e))?;

        if let Some(analysis) = analysis {
            self.graph
                .upsert_analysis(&item.id, analysis)
                .await
                .map_err(|e| format!("analysis node: {}", e))?;
        }

        if let Some(features) = features {
            self.graph
                .upsert_features(&item.id, features)
                .await
                .map_err(|e| format!("features node: {}", e))?;
        }

        Ok(())
    }

    async fn write_relational(
        &self,
        item: &MediaItem,
        duration: f64,
        analysis: Option<&AnalysisResult>,
        features: Option<&AudioFeatures>,
    ) -> Result<(), String> {
        let media_id = self
            .relational
            .upsert_media(item, duration)
            .await
            .map_err(|e| format!("media row: {}", e))?;

        if let Some(analysis) = analysis {
            self.relational
                .insert_analysis(&media_id, analysis, features)
                .await
                .map_err(|e| format!("analysis row: {}", e))?;
        }

        Ok(())
    }
}

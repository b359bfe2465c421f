//! Graph store
//!
//! Three node labels (`Media`, `Analysis`, `AudioFeatures`) joined by
//! `HAS_ANALYSIS` and `HAS_FEATURES`. Every write merges by key and then
//! overwrites fields, so repeated writes of the same item converge.

mod neo4j_http;

pub use neo4j_http::Neo4jHttpStore;

use jfai_common::{AnalysisResult, AudioFeatures, MediaItem};
use thiserror::Error;

/// Upsert the media node
pub const UPSERT_MEDIA: &str = "\
MERGE (m:Media {id: $media_id})
SET m.name = $name,
    m.path = $path,
    m.type = $type,
    m.duration = $duration,
    m.created_at = datetime()";

/// Upsert the analysis node and link it to its media node
pub const UPSERT_ANALYSIS: &str = "\
MATCH (m:Media {id: $media_id})
MERGE (a:Analysis {media_id: $media_id})
SET a.ai_description = $description,
    a.ai_analysis = $analysis,
    a.created_at = datetime()
MERGE (m)-[:HAS_ANALYSIS]->(a)";

/// Upsert the features node and link it to its media node
pub const UPSERT_FEATURES: &str = "\
MATCH (m:Media {id: $media_id})
MERGE (f:AudioFeatures {media_id: $media_id})
SET f += $features,
    f.created_at = datetime()
MERGE (m)-[:HAS_FEATURES]->(f)";

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Graph endpoint returned HTTP {0}: {1}")]
    Status(u16, String),

    #[error("Cypher error {code}: {message}")]
    Cypher { code: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

#[async_trait::async_trait]
pub trait GraphStore: Send + Sync {
    async fn upsert_media(&self, item: &MediaItem, duration: f64) -> Result<(), GraphError>;

    async fn upsert_analysis(
        &self,
        media_id: &str,
        analysis: &AnalysisResult,
    ) -> Result<(), GraphError>;

    async fn upsert_features(
        &self,
        media_id: &str,
        features: &AudioFeatures,
    ) -> Result<(), GraphError>;
}

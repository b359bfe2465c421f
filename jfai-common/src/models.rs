//! Shared data model for the media processing pipeline
//!
//! - [`MediaItem`]: one audio entry listed by the media server
//! - [`AudioFeatures`]: technical descriptors computed from the file
//! - [`AnalysisResult`]: the AI analyzer's response

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of timbre (MFCC) coefficients kept per item
pub const MFCC_COEFFICIENTS: usize = 13;

/// Audio item as listed by the media server
///
/// Field names follow the server's PascalCase JSON. Only `Id` is required;
/// the server omits `Path` for items it cannot resolve on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Stable server-side identifier
    #[serde(rename = "Id")]
    pub id: String,
    /// Display name
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Filesystem path as seen by the processor
    #[serde(rename = "Path", default)]
    pub path: String,
    /// Type tag (e.g. "Audio")
    #[serde(rename = "Type", default)]
    pub item_type: String,
}

impl MediaItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
        item_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            item_type: item_type.into(),
        }
    }

    /// Name for log lines ("Unknown" when the server sent none)
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Unknown"
        } else {
            &self.name
        }
    }

    /// Dedup cache key for this item
    pub fn cache_key(&self) -> String {
        processed_key(&self.id)
    }
}

/// Cache key recording that an item id was processed
pub fn processed_key(item_id: &str) -> String {
    format!("processed:{}", item_id)
}

/// Technical audio descriptors for one file
///
/// Keys serialize in snake_case; the same map is written as graph node
/// properties and as the relational `audio_features` JSON column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// Estimated tempo in beats per minute
    pub tempo: f64,
    /// Duration in seconds
    pub duration: f64,
    /// Per-coefficient mean of the MFCC frames
    pub mfcc_mean: Vec<f64>,
    /// Mean spectral centroid in Hz
    pub spectral_centroid_mean: f64,
    /// Mean 85% spectral rolloff in Hz
    pub spectral_rolloff_mean: f64,
    /// Mean zero-crossing rate (crossings per sample)
    pub zero_crossing_rate_mean: f64,
    /// Analysis sample rate in Hz
    pub sample_rate: u32,
}

impl AudioFeatures {
    /// Features as a JSON object (for graph properties and JSON columns)
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

/// AI analyzer response
///
/// `payload` holds the full parsed response body. `description` is `None`
/// when the analyzer returned no `description` field, which is not the same
/// as returning an empty one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub description: Option<String>,
    pub payload: Value,
}

impl AnalysisResult {
    /// Build from a parsed response body
    ///
    /// Returns `None` for `null` and for an empty JSON object: the analyzer
    /// answered but said nothing.
    pub fn from_payload(payload: Value) -> Option<Self> {
        match &payload {
            Value::Null => return None,
            Value::Object(map) if map.is_empty() => return None,
            _ => {}
        }

        let description = payload
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(Self {
            description,
            payload,
        })
    }

    /// Description text, empty when absent
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

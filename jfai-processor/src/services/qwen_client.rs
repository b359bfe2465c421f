//! Qwen-Audio inference client
//!
//! Uploads an audio file as multipart form data to `{base}/analyze` with a
//! fixed instruction prompt and a token budget.

use jfai_common::config::AnalyzerConfig;
use jfai_common::AnalysisResult;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Instruction sent with every file
pub const ANALYSIS_PROMPT: &str = "Analyze this audio content. Describe the genre, mood, instruments, vocals, and any notable characteristics.";

/// AI analyzer errors
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Failed to read audio file: {0}")]
    File(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for AnalyzerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AnalyzerError::Timeout
        } else {
            AnalyzerError::Network(err.to_string())
        }
    }
}

/// Produces a description of an audio file
///
/// `Ok(None)` means the analyzer answered with nothing usable.
#[async_trait::async_trait]
pub trait AudioAnalyzer: Send + Sync {
    async fn analyze(&self, path: &Path) -> Result<Option<AnalysisResult>, AnalyzerError>;
}

pub struct QwenAudioClient {
    http_client: reqwest::Client,
    endpoint: String,
    max_tokens: u32,
}

impl QwenAudioClient {
    pub fn new(config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/analyze", config.url.trim_end_matches('/')),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait::async_trait]
impl AudioAnalyzer for QwenAudioClient {
    async fn analyze(&self, path: &Path) -> Result<Option<AnalysisResult>, AnalyzerError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let form = reqwest::multipart::Form::new()
            .part("audio", reqwest::multipart::Part::bytes(bytes).file_name(file_name))
            .text("prompt", ANALYSIS_PROMPT)
            .text("max_tokens", self.max_tokens.to_string());

        tracing::debug!(path = %path.display(), endpoint = %self.endpoint, "Requesting AI analysis");

        let response = self.http_client.post(&self.endpoint).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::Api(status.as_u16(), error_text));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AnalyzerError::Timeout
            } else {
                AnalyzerError::Parse(e.to_string())
            }
        })?;

        Ok(AnalysisResult::from_payload(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_built_from_base() {
        let config = AnalyzerConfig {
            url: "http://qwen-audio:8000/".to_string(),
            ..Default::default()
        };
        let client = QwenAudioClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "http://qwen-audio:8000/analyze");
        assert_eq!(client.max_tokens, 500);
    }

    #[tokio::test]
    async fn test_missing_file_is_file_error() {
        let client = QwenAudioClient::new(&AnalyzerConfig::default()).unwrap();
        let result = client.analyze(Path::new("/nonexistent/track.mp3")).await;
        assert!(matches!(result, Err(AnalyzerError::File(_))));
    }
}

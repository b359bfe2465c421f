//! Jellyfin library client
//!
//! Authenticates with username/password and lists every audio item in the
//! library. One token exchange per listing; no retry within a call.

use jfai_common::config::JellyfinConfig;
use jfai_common::MediaItem;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const CLIENT_HEADER: &str = r#"MediaBrowser Client="jfai-processor", Device="server", DeviceId="jfai-processor", Version="0.1.0""#;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Library listing errors
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{stage} returned HTTP {status}")]
    Status { stage: &'static str, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Source of media items to process
#[async_trait::async_trait]
pub trait LibrarySource: Send + Sync {
    async fn list_audio_items(&self) -> Result<Vec<MediaItem>, LibraryError>;
}

#[derive(Serialize)]
struct AuthenticateRequest<'a> {
    #[serde(rename = "Username")]
    username: &'a str,
    #[serde(rename = "Pw")]
    pw: &'a str,
}

#[derive(Deserialize)]
struct AuthenticateResponse {
    #[serde(rename = "AccessToken")]
    access_token: String,
}

#[derive(Deserialize)]
struct ItemsResponse {
    #[serde(rename = "Items", default)]
    items: Vec<MediaItem>,
}

pub struct JellyfinClient {
    http_client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl JellyfinClient {
    pub fn new(config: &JellyfinConfig) -> Result<Self, LibraryError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LibraryError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    async fn authenticate(&self) -> Result<String, LibraryError> {
        let url = format!("{}/Users/AuthenticateByName", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("X-Emby-Authorization", CLIENT_HEADER)
            .json(&AuthenticateRequest {
                username: &self.username,
                pw: &self.password,
            })
            .send()
            .await
            .map_err(|e| LibraryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LibraryError::Status {
                stage: "authentication",
                status: status.as_u16(),
            });
        }

        let body: AuthenticateResponse = response
            .json()
            .await
            .map_err(|e| LibraryError::Parse(e.to_string()))?;

        Ok(body.access_token)
    }
}

#[async_trait::async_trait]
impl LibrarySource for JellyfinClient {
    async fn list_audio_items(&self) -> Result<Vec<MediaItem>, LibraryError> {
        let token = self.authenticate().await?;

        let url = format!("{}/Items", self.base_url);
        tracing::debug!(url = %url, "Listing audio items");

        let response = self
            .http_client
            .get(&url)
            .query(&[("Recursive", "true"), ("IncludeItemTypes", "Audio")])
            .header("Authorization", format!("MediaBrowser Token={}", token))
            .send()
            .await
            .map_err(|e| LibraryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LibraryError::Status {
                stage: "item listing",
                status: status.as_u16(),
            });
        }

        let body: ItemsResponse = response
            .json()
            .await
            .map_err(|e| LibraryError::Parse(e.to_string()))?;

        tracing::debug!(count = body.items.len(), "Retrieved library items");

        Ok(body.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = JellyfinConfig {
            url: "http://jellyfin:8096/".to_string(),
            ..Default::default()
        };
        let client = JellyfinClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://jellyfin:8096");
    }

    #[test]
    fn test_items_response_tolerates_missing_items() {
        let body: ItemsResponse = serde_json::from_str("{}").unwrap();
        assert!(body.items.is_empty());
    }

    #[test]
    fn test_status_error_message() {
        let err = LibraryError::Status {
            stage: "authentication",
            status: 401,
        };
        assert_eq!(err.to_string(), "authentication returned HTTP 401");
    }
}

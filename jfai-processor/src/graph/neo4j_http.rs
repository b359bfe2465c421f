//! Neo4j over its HTTP transactional Cypher endpoint
//!
//! Each upsert is one auto-committed transaction:
//! `POST {uri}/db/{database}/tx/commit` with basic auth.

use super::{GraphError, GraphStore, UPSERT_ANALYSIS, UPSERT_FEATURES, UPSERT_MEDIA};
use jfai_common::config::GraphConfig;
use jfai_common::{AnalysisResult, AudioFeatures, MediaItem};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: Value,
}

#[derive(Serialize)]
struct CommitRequest<'a> {
    statements: Vec<Statement<'a>>,
}

#[derive(Debug, Deserialize)]
struct CypherError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    errors: Vec<CypherError>,
}

pub struct Neo4jHttpStore {
    http_client: reqwest::Client,
    commit_url: String,
    user: String,
    password: String,
}

impl Neo4jHttpStore {
    pub fn new(config: &GraphConfig) -> Result<Self, GraphError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GraphError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            commit_url: format!(
                "{}/db/{}/tx/commit",
                config.uri.trim_end_matches('/'),
                config.database
            ),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    async fn run(&self, statement: &str, parameters: Value) -> Result<(), GraphError> {
        let request = CommitRequest {
            statements: vec![Statement {
                statement,
                parameters,
            }],
        };

        let response = self
            .http_client
            .post(&self.commit_url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| GraphError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GraphError::Status(status.as_u16(), error_text));
        }

        let body: CommitResponse = response
            .json()
            .await
            .map_err(|e| GraphError::Parse(e.to_string()))?;

        // Statement failures come back as 200 with an errors array
        match body.errors.into_iter().next() {
            Some(err) => Err(GraphError::Cypher {
                code: err.code,
                message: err.message,
            }),
            None => Ok(()),
        }
    }
}

pub(crate) fn media_parameters(item: &MediaItem, duration: f64) -> Value {
    json!({
        "media_id": item.id,
        "name": item.name,
        "path": item.path,
        "type": item.item_type,
        "duration": duration,
    })
}

pub(crate) fn analysis_parameters(media_id: &str, analysis: &AnalysisResult) -> Value {
    json!({
        "media_id": media_id,
        "description": analysis.description_or_empty(),
        "analysis": analysis.payload.to_string(),
    })
}

pub(crate) fn features_parameters(media_id: &str, features: &AudioFeatures) -> Value {
    json!({
        "media_id": media_id,
        "features": features.to_json(),
    })
}

#[async_trait::async_trait]
impl GraphStore for Neo4jHttpStore {
    async fn upsert_media(&self, item: &MediaItem, duration: f64) -> Result<(), GraphError> {
        self.run(UPSERT_MEDIA, media_parameters(item, duration)).await
    }

    async fn upsert_analysis(
        &self,
        media_id: &str,
        analysis: &AnalysisResult,
    ) -> Result<(), GraphError> {
        self.run(UPSERT_ANALYSIS, analysis_parameters(media_id, analysis))
            .await
    }

    async fn upsert_features(
        &self,
        media_id: &str,
        features: &AudioFeatures,
    ) -> Result<(), GraphError> {
        self.run(UPSERT_FEATURES, features_parameters(media_id, features))
            .await
    }
}

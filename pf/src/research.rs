//! Research client seam
//!
//! The research capability answers enrichment queries asynchronously. The
//! compute tier only shapes the client-facing latency estimate; any hard
//! timeout belongs to this client, never to the task orchestrator.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::ResearchConfig;
use crate::domain::ComputeTier;

/// Errors that can occur during research calls
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Empty result for query")]
    EmptyResult,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client for the external research capability
#[async_trait]
pub trait ResearchClient: Send + Sync {
    /// Run one enrichment query; suspends until the payload is available
    async fn research(&self, query: &str, tier: ComputeTier) -> Result<serde_json::Value, ResearchError>;
}

/// HTTP research client
pub struct HttpResearchClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl HttpResearchClient {
    /// Create a new client from configuration
    pub fn from_config(config: &ResearchConfig) -> Result<Self, ResearchError> {
        debug!(base_url = %config.base_url, "HttpResearchClient::from_config: called");
        let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(ResearchError::Network)?;

        Ok(Self {
            base_url: config.base_url.clone(),
            api_key,
            http,
        })
    }
}

#[async_trait]
impl ResearchClient for HttpResearchClient {
    async fn research(&self, query: &str, tier: ComputeTier) -> Result<serde_json::Value, ResearchError> {
        debug!(query_len = query.len(), ?tier, "HttpResearchClient::research: called");

        let url = format!("{}/v1/research", self.base_url);
        let body = serde_json::json!({
            "query": query,
            "tier": tier.as_str(),
        });

        let response = self.http.post(&url).bearer_auth(&self.api_key).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(ResearchError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let payload: serde_json::Value = response.json().await?;
        if payload.is_null() {
            return Err(ResearchError::EmptyResult);
        }

        Ok(payload)
    }
}

//! HTTP reasoner client implementation
//!
//! Talks to a structured-generation endpoint that accepts a prompt plus a
//! JSON schema and returns a conforming result with usage accounting.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{CallCost, ReasonerClient, ReasonerError, ReasonerRequest, StructuredResult};
use crate::config::ReasonerConfig;

/// HTTP client for the structured reasoning endpoint
pub struct HttpReasonerClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    result: serde_json::Value,
    #[serde(default)]
    usage: ApiUsage,
}

#[derive(Debug, Default, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

impl HttpReasonerClient {
    /// Create a new client from configuration
    pub fn from_config(config: &ReasonerConfig) -> Result<Self, ReasonerError> {
        debug!(model = %config.model, base_url = %config.base_url, "HttpReasonerClient::from_config: called");
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ReasonerError::SchemaMismatch(format!("API key env var {} not set", config.api_key_env)))?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(ReasonerError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.clone(),
            http,
            timeout,
        })
    }

    fn build_request_body(&self, request: &ReasonerRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "prompt": request.prompt,
            "schema": request.schema,
            "max_tokens": request.max_tokens,
        })
    }
}

#[async_trait]
impl ReasonerClient for HttpReasonerClient {
    async fn invoke(&self, request: ReasonerRequest) -> Result<StructuredResult, ReasonerError> {
        debug!(prompt_len = request.prompt.len(), "HttpReasonerClient::invoke: called");

        let url = format!("{}/v1/structured", self.base_url);
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReasonerError::Timeout(self.timeout)
                } else {
                    ReasonerError::Network(e)
                }
            })?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(60));
            return Err(ReasonerError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let message = response
                .json::<ApiError>()
                .await
                .map(|e| e.message)
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ReasonerError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: ApiResponse = response.json().await.map_err(ReasonerError::Network)?;

        if api_response.result.is_null() {
            return Err(ReasonerError::SchemaMismatch("endpoint returned null result".to_string()));
        }

        debug!(
            input_tokens = api_response.usage.input_tokens,
            output_tokens = api_response.usage.output_tokens,
            "HttpReasonerClient::invoke: complete"
        );

        Ok(StructuredResult {
            value: api_response.result,
            cost: CallCost {
                calls: 1,
                input_tokens: api_response.usage.input_tokens,
                output_tokens: api_response.usage.output_tokens,
            },
        })
    }
}

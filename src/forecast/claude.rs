//! Blocking client for the Anthropic Messages API.
//!
//! Single prompt in, concatenated text out. No streaming, no tools.

use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("{0} not set")]
    MissingApiKey(String),

    #[error("format error: {0}")]
    Format(String),
}

// ---------------------------------------------------------------------------
// Seam
// ---------------------------------------------------------------------------

/// Anything that can turn a prompt into model text.
pub trait ModelClient: Sync {
    fn complete(&self, prompt: &str) -> Result<String, ModelError>;

    /// Short model name reported in forecast metadata.
    fn model_label(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ApiMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl ApiResponse {
    fn text(self) -> String {
        self.content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct ClaudeClient {
    client: reqwest::blocking::Client,
    api_key: String,
    config: ModelConfig,
}

impl ClaudeClient {
    /// Builds a client, reading the API key from the variable named by
    /// `config.api_key_env`.
    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ModelError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_key(config, api_key)
    }

    pub fn with_key(config: &ModelConfig, api_key: impl Into<String>) -> Result<Self, ModelError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            config: config.clone(),
        })
    }
}

impl ModelClient for ClaudeClient {
    fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let body = ApiRequest {
            model: &self.config.model_id,
            max_tokens: self.config.max_tokens,
            messages: [ApiMessage { role: "user", content: prompt }],
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.config.api_version)
            .header("content-type", "application/json")
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ModelError::Api { status: status.as_u16(), message });
        }

        let text = response.json::<ApiResponse>()?.text();
        if text.is_empty() {
            return Err(ModelError::Format("response had no text content".to_string()));
        }
        Ok(text)
    }

    fn model_label(&self) -> &str {
        &self.config.label
    }
}

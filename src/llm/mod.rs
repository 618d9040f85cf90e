//! Model backends.
//!
//! Every backend is driven through one shape: a composed prompt string in,
//! the model's continuation text out. Chat-style APIs receive the prompt as a
//! single user message.

mod ollama;
mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{LlmConfig, Provider};

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode model response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Missing API key: set OPENAI_API_KEY or api_key in the config file")]
    MissingApiKey,
}

/// Message role in a chat-completions request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    /// Some APIs send `null` content for empty completions.
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
        }
    }
}

/// A blocking text-generation backend.
///
/// Timeouts and cancellation are the backend's concern; the agent loop awaits
/// each call to completion.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate the continuation for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Build the backend selected by `config`.
pub fn build_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    let client: Arc<dyn LlmClient> = match config.provider {
        Provider::OpenAi => {
            let api_key = config.api_key.clone().ok_or(LlmError::MissingApiKey)?;
            Arc::new(OpenAiClient::new(api_key, config))
        }
        Provider::Ollama => Arc::new(OllamaClient::new(config)),
    };
    tracing::info!(
        "Using {:?} backend with model {}",
        config.provider,
        config.model
    );
    Ok(client)
}

/// Map a non-success response into `LlmError::Api`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LlmError::Api {
        status: status.as_u16(),
        body,
    })
}

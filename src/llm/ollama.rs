//! Local model inference through an Ollama server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{check_status, LlmClient, LlmError};
use crate::config::LlmConfig;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Raw-prompt completion client for `/api/generate`.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Self {
        let base_url = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            options: GenerateOptions {
                temperature: config.temperature,
                top_p: config.top_p,
                num_predict: config.max_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: &self.options,
        };

        tracing::debug!("POST {} (model={})", url, self.model);
        let response = self.client.post(&url).json(&body).send().await?;
        let response = check_status(response).await?;
        let raw = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&raw)?;

        Ok(strip_echoed_prompt(parsed.response, prompt))
    }
}

/// Some local runtimes echo the prompt before the continuation.
fn strip_echoed_prompt(text: String, prompt: &str) -> String {
    match text.strip_prefix(prompt) {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn echoed_prompt_is_removed() {
        assert_eq!(
            strip_echoed_prompt("Q: 1+1?\nFinal: 2".to_string(), "Q: 1+1?\n"),
            "Final: 2"
        );
        assert_eq!(strip_echoed_prompt("Final: 2".to_string(), "Q"), "Final: 2");
    }

    #[tokio::test]
    async fn posts_non_streaming_generate_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "qwen-local",
                "prompt": "ping",
                "stream": false,
                "options": {"num_predict": 1024}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "Final: pong",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = LlmConfig {
            api_base: Some(server.uri()),
            model: "qwen-local".to_string(),
            ..LlmConfig::default()
        };
        let text = OllamaClient::new(&config).generate("ping").await.unwrap();
        assert_eq!(text, "Final: pong");
    }

    #[tokio::test]
    async fn garbage_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let config = LlmConfig {
            api_base: Some(server.uri()),
            ..LlmConfig::default()
        };
        let err = OllamaClient::new(&config).generate("ping").await.unwrap_err();
        assert!(matches!(err, LlmError::Decode(_)));
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;

use crate::config::AppConfig;
use crate::errors::RagError;

use super::provider::{Embedder, Generator};

/// Client for OpenAI-compatible embedding and chat-completion endpoints.
///
/// Works against api.openai.com as well as local servers speaking the same
/// protocol (LM Studio, llama.cpp, Ollama's compat layer). Requests carry a
/// client-level timeout; an expired deadline surfaces as `RagError::Timeout`.
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    embed_base_url: String,
    embed_model: String,
    embed_api_key: Option<String>,
    chat_base_url: String,
    chat_model: String,
    chat_api_key: Option<String>,
    temperature: f64,
    timeout_secs: u64,
    client: Client,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiCompatProvider {
    pub fn new(config: &AppConfig) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RagError::InvalidInput(format!("cannot build http client: {}", e)))?;

        Ok(Self {
            embed_base_url: config.embedding.base_url.trim_end_matches('/').to_string(),
            embed_model: config.embedding.model.clone(),
            embed_api_key: config.embedding.api_key.clone(),
            chat_base_url: config.generation.base_url.trim_end_matches('/').to_string(),
            chat_model: config.generation.model.clone(),
            chat_api_key: config.generation.api_key.clone(),
            temperature: config.generation.temperature,
            timeout_secs: config.request_timeout_secs,
            client,
        })
    }

    fn with_auth(request: RequestBuilder, api_key: &Option<String>) -> RequestBuilder {
        match api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn map_request_error(
        &self,
        err: reqwest::Error,
        operation: &'static str,
        service_error: fn(String) -> RagError,
    ) -> RagError {
        if err.is_timeout() {
            RagError::Timeout {
                operation,
                seconds: self.timeout_secs,
            }
        } else {
            service_error(err.to_string())
        }
    }
}

#[async_trait]
impl Embedder for OpenAiCompatProvider {
    fn id(&self) -> String {
        format!("openai-compat:{}", self.embed_model)
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let url = format!("{}/v1/embeddings", self.embed_base_url);
        let body = json!({
            "model": self.embed_model,
            "input": inputs,
        });

        let request = Self::with_auth(self.client.post(&url), &self.embed_api_key).json(&body);
        let res = request
            .send()
            .await
            .map_err(|e| self.map_request_error(e, "embedding request", RagError::EmbeddingService))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::EmbeddingService(format!(
                "embeddings endpoint returned {}: {}",
                status, text
            )));
        }

        let payload: EmbeddingsResponse = res.json().await.map_err(RagError::embedding)?;

        // The API may reorder items; `index` ties each vector to its input.
        let mut items = payload.data;
        items.sort_by_key(|item| item.index);

        if items.len() != inputs.len() {
            return Err(RagError::EmbeddingService(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                items.len()
            )));
        }

        Ok(items.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl Generator for OpenAiCompatProvider {
    async fn generate(&self, prompt: &str) -> Result<String, RagError> {
        let url = format!("{}/v1/chat/completions", self.chat_base_url);
        let body = json!({
            "model": self.chat_model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
            "stream": false,
        });

        let request = Self::with_auth(self.client.post(&url), &self.chat_api_key).json(&body);
        let res = request
            .send()
            .await
            .map_err(|e| self.map_request_error(e, "generation request", RagError::GenerationService))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::GenerationService(format!(
                "chat endpoint returned {}: {}",
                status, text
            )));
        }

        let payload: serde_json::Value = res.json().await.map_err(RagError::generation)?;
        extract_chat_content(&payload)
    }
}

/// Pull the answer text out of a chat-completion payload. A response without
/// `choices[0].message.content` is a service error, not an empty answer.
fn extract_chat_content(payload: &serde_json::Value) -> Result<String, RagError> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            RagError::GenerationService("chat response missing message content".to_string())
        })
}

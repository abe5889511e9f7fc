//! Ollama generation backend

use async_trait::async_trait;
use serde::Deserialize;

use super::http_client::{HttpClientTrait, HttpError};
use crate::domain::DomainError;
use crate::domain::semantic_cache::{GeneratedResponse, ResponseGenerator};
use crate::domain::signature::PromptSignature;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Response generator calling a local Ollama server
#[derive(Debug)]
pub struct OllamaGenerator<C: HttpClientTrait> {
    client: C,
    base_url: String,
    model: String,
}

impl<C: HttpClientTrait> OllamaGenerator<C> {
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self::with_base_url(client, model, DEFAULT_OLLAMA_BASE_URL)
    }

    pub fn with_base_url(client: C, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn build_request(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        })
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<GeneratedResponse, DomainError> {
        let response: OllamaGenerateResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::generation("decode", format!("Failed to parse Ollama response: {}", e))
        })?;

        let mut generated = GeneratedResponse::new(response.response)
            .with_model_id(response.model.unwrap_or_else(|| self.model.clone()));

        if let Some(eval_count) = response.eval_count {
            generated = generated.with_token_count(eval_count);
        }

        Ok(generated)
    }
}

fn generation_error(error: HttpError) -> DomainError {
    DomainError::generation(error.kind(), error.to_string())
}

#[async_trait]
impl<C: HttpClientTrait> ResponseGenerator for OllamaGenerator<C> {
    async fn generate(&self, signature: &PromptSignature) -> Result<GeneratedResponse, DomainError> {
        let body = self.build_request(signature.source_text());

        let response = self
            .client
            .post_json(&self.generate_url(), vec![("Content-Type", "application/json")], &body)
            .await
            .map_err(generation_error)?;

        self.parse_response(response)
    }

    fn model_id(&self) -> Option<&str> {
        Some(&self.model)
    }
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    model: Option<String>,
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
}

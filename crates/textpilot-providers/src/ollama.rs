use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ProviderError;
use crate::registry::ProviderKind;
use crate::{GenerationConfig, ProviderAdapter};

const OLLAMA_DEFAULT_ENDPOINT: &str = "http://localhost:11434";
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_NUM_PREDICT: u32 = 2048;

/// Local Ollama adapter. Needs no credential; the "credential" settings slot
/// doubles as an endpoint override so the validation surface can probe a
/// server with nothing but the key field.
pub struct OllamaAdapter {
    client: Client,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaAdapter {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Endpoint fallback chain: explicit endpoint, then the credential field
    /// holding a URL, then the fixed local default.
    fn effective_endpoint(config: &GenerationConfig) -> String {
        config
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| config.api_key.as_deref().filter(|k| !k.trim().is_empty()))
            .unwrap_or(OLLAMA_DEFAULT_ENDPOINT)
            .trim_end_matches('/')
            .to_string()
    }

    fn api_model(model_id: &str) -> &str {
        model_id.strip_prefix("ollama-").unwrap_or(model_id)
    }

    fn build_request_body(&self, prompt: &str, config: &GenerationConfig) -> Value {
        let mut options = json!({
            "temperature": config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            "num_predict": config.max_tokens.unwrap_or(DEFAULT_NUM_PREDICT),
        });
        if let Some(top_p) = config.top_p {
            options["top_p"] = json!(top_p);
        }

        json!({
            "model": Self::api_model(&config.model),
            "prompt": prompt,
            "stream": false,
            "options": options,
        })
    }
}

impl Default for OllamaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn generate_content(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, ProviderError> {
        let endpoint = Self::effective_endpoint(config);
        let url = format!("{endpoint}/api/generate");

        let response = self
            .client
            .post(&url)
            .json(&self.build_request_body(prompt, config))
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("Ollama request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(ProviderError::Upstream(format!(
                "Ollama rejected the request (403 Forbidden). Set OLLAMA_ORIGINS=\"*\" on the \
                 server at {endpoint} and restart it to allow requests from this app."
            )));
        }
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let message = if body_text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body_text
            };
            return Err(ProviderError::Upstream(message));
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(format!("Failed to parse Ollama response: {e}")))?;

        if payload.response.is_empty() {
            return Err(ProviderError::EmptyResponse("Ollama"));
        }
        Ok(payload.response)
    }
}

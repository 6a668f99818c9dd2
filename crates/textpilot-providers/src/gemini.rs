use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{ProviderError, upstream_message};
use crate::registry::ProviderKind;
use crate::{GenerationConfig, ProviderAdapter};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Total attempts, covering both rate-limit and transient retries.
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;

/// Gemini generateContent adapter. The only adapter with a retry policy:
/// HTTP 429 backs off exponentially, network and parse failures retry after
/// a fixed delay, and any other upstream error surfaces immediately.
pub struct GeminiAdapter {
    client: Client,
    base_url: String,
}

impl GeminiAdapter {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn build_request_body(&self, prompt: &str, config: &GenerationConfig) -> Value {
        let mut generation_config = json!({
            "maxOutputTokens": config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "temperature": config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        });
        if let Some(top_p) = config.top_p {
            generation_config["topP"] = json!(top_p);
        }

        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": generation_config,
        })
    }

    async fn attempt(&self, url: &str, body: &Value) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("Gemini request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let message = upstream_message(&body_text)
                .unwrap_or_else(|| format!("API error: {}", status.as_u16()));
            return if status == StatusCode::TOO_MANY_REQUESTS {
                Err(ProviderError::RateLimited(message))
            } else {
                Err(ProviderError::Upstream(message))
            };
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(format!("Failed to parse Gemini response: {e}")))?;

        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse("Gemini"));
        }
        Ok(text.to_string())
    }
}

impl Default for GeminiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn generate_content(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, ProviderError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ProviderError::MissingCredential("Gemini"))?;

        // Catalog ids for Gemini already equal the API model name.
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, config.model, api_key
        );
        let body = self.build_request_body(prompt, config);

        let mut attempt = 0;
        loop {
            match self.attempt(&url, &body).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_rate_limit() => {
                    attempt += 1;
                    if attempt >= MAX_ATTEMPTS {
                        return Err(err);
                    }
                    let delay = Duration::from_millis(RETRY_DELAY_MS * 2u64.pow(attempt - 1));
                    debug!(attempt, ?delay, "Gemini rate limited; backing off");
                    tokio::time::sleep(delay).await;
                }
                Err(err) if err.is_transient() => {
                    attempt += 1;
                    if attempt >= MAX_ATTEMPTS {
                        return Err(err);
                    }
                    debug!(attempt, "Gemini request failed; retrying");
                    tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_gemini_field_names() {
        let adapter = GeminiAdapter::new();
        let config = GenerationConfig {
            model: "gemini-2.5-flash".to_string(),
            temperature: Some(0.4),
            top_p: Some(0.9),
            max_tokens: Some(256),
            ..Default::default()
        };

        let body = adapter.build_request_body("Hello", &config);

        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
        assert_eq!(body["generationConfig"]["temperature"], 0.4);
        assert_eq!(body["generationConfig"]["topP"], 0.9);
    }

    #[test]
    fn request_body_defaults_omit_top_p() {
        let adapter = GeminiAdapter::new();
        let config = GenerationConfig {
            model: "gemini-2.5-flash".to_string(),
            ..Default::default()
        };

        let body = adapter.build_request_body("Hello", &config);

        assert_eq!(body["generationConfig"]["temperature"], DEFAULT_TEMPERATURE);
        assert_eq!(
            body["generationConfig"]["maxOutputTokens"],
            DEFAULT_MAX_TOKENS
        );
        assert!(body["generationConfig"].get("topP").is_none());
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::catalog;
use crate::error::{ProviderError, upstream_message};
use crate::registry::ProviderKind;
use crate::{GenerationConfig, ProviderAdapter};

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Groq chat-completions adapter. Single attempt, no retry.
pub struct GroqAdapter {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl GroqAdapter {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: GROQ_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Catalog ids carry a `groq-` prefix distinct from Groq's own model
    /// names; translate through the catalog, falling back to a prefix strip
    /// for ids the catalog does not know.
    fn api_model(model_id: &str) -> String {
        catalog::api_model_name(model_id)
            .map(ToString::to_string)
            .unwrap_or_else(|| {
                model_id
                    .strip_prefix("groq-")
                    .unwrap_or(model_id)
                    .to_string()
            })
    }

    fn build_request_body(&self, prompt: &str, config: &GenerationConfig) -> Value {
        json!({
            "model": Self::api_model(&config.model),
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            "max_tokens": config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }
}

impl Default for GroqAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for GroqAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Groq
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
            .ok_or(ProviderError::MissingCredential("Groq"))?;

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.build_request_body(prompt, config))
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("Groq request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let message = upstream_message(&body_text)
                .unwrap_or_else(|| format!("Groq API error: {}", status.as_u16()));
            return Err(ProviderError::Upstream(message));
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(format!("Failed to parse Groq response: {e}")))?;

        let text = payload
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse("Groq"));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_translates_model_through_catalog() {
        let adapter = GroqAdapter::new();
        let config = GenerationConfig {
            model: "groq-llama-3.3-70b".to_string(),
            ..Default::default()
        };

        let body = adapter.build_request_body("Hi", &config);

        assert_eq!(body["model"], "llama-3.3-70b-versatile");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hi");
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn unknown_groq_id_falls_back_to_prefix_strip() {
        assert_eq!(
            GroqAdapter::api_model("groq-some-new-model"),
            "some-new-model"
        );
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::catalog;
use crate::error::{ProviderError, upstream_message};
use crate::registry::ProviderKind;
use crate::{GenerationConfig, ProviderAdapter};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// OpenAI chat-completions adapter. Single attempt, no retry. Same request
/// shape as Groq except the token cap field, which newer OpenAI models only
/// accept as `max_completion_tokens`.
pub struct OpenAiAdapter {
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

impl OpenAiAdapter {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn api_model(model_id: &str) -> String {
        catalog::api_model_name(model_id)
            .map(ToString::to_string)
            .unwrap_or_else(|| {
                model_id
                    .strip_prefix("openai-")
                    .unwrap_or(model_id)
                    .to_string()
            })
    }

    fn build_request_body(&self, prompt: &str, config: &GenerationConfig) -> Value {
        json!({
            "model": Self::api_model(&config.model),
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            "max_completion_tokens": config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }
}

impl Default for OpenAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
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
            .ok_or(ProviderError::MissingCredential("OpenAI"))?;

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.build_request_body(prompt, config))
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let message = upstream_message(&body_text)
                .unwrap_or_else(|| format!("OpenAI API error: {}", status.as_u16()));
            return Err(ProviderError::Upstream(message));
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(format!("Failed to parse OpenAI response: {e}")))?;

        let text = payload
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse("OpenAI"));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_max_completion_tokens() {
        let adapter = OpenAiAdapter::new();
        let config = GenerationConfig {
            model: "openai-gpt-4o-mini".to_string(),
            max_tokens: Some(512),
            ..Default::default()
        };

        let body = adapter.build_request_body("Hi", &config);

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_completion_tokens"], 512);
        assert!(body.get("max_tokens").is_none());
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::diagnostics::{DiagnosticsSink, TracingDiagnostics, activation_url};
use crate::error::{ProviderError, upstream_message};
use crate::registry::ProviderKind;
use crate::{GenerationConfig, ProviderAdapter};

const ANTIGRAVITY_API_URL: &str = "https://cloudcode-pa.googleapis.com";
const ANTIGRAVITY_PROJECT: &str = "default";
const ANTIGRAVITY_USER_AGENT: &str = "textpilot";
const CLIENT_METADATA: &str = r#"{"ideType":"antigravity","platform":"web"}"#;
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Antigravity adapter: Gemini-family models behind the cloudcode internal
/// endpoint. Bearer auth, client-metadata headers, and a fresh request id per
/// call. Single attempt, no retry.
pub struct AntigravityAdapter {
    client: Client,
    base_url: String,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    project: &'a str,
    model: String,
    request: InnerRequest<'a>,
    user_agent: &'a str,
    request_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InnerRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: InnerGenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InnerGenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

impl AntigravityAdapter {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: ANTIGRAVITY_API_URL.to_string(),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    fn api_model(model_id: &str) -> &str {
        model_id.strip_prefix("antigravity-").unwrap_or(model_id)
    }

    fn build_request<'a>(&self, prompt: &'a str, config: &GenerationConfig) -> GenerateRequest<'a> {
        GenerateRequest {
            project: ANTIGRAVITY_PROJECT,
            model: Self::api_model(&config.model).to_string(),
            request: InnerRequest {
                contents: vec![Content {
                    role: "user",
                    parts: vec![Part { text: prompt }],
                }],
                generation_config: InnerGenerationConfig {
                    max_output_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
                    temperature: config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                    top_p: config.top_p,
                },
                system_instruction: None,
            },
            user_agent: ANTIGRAVITY_USER_AGENT,
            request_id: Uuid::new_v4().to_string(),
        }
    }
}

impl Default for AntigravityAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for AntigravityAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Antigravity
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
            .ok_or(ProviderError::MissingCredential("Antigravity"))?;

        let url = format!("{}/v1internal:generateContent", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("Client-Metadata", CLIENT_METADATA)
            .json(&self.build_request(prompt, config))
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("Antigravity request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let message = upstream_message(&body_text)
                .unwrap_or_else(|| format!("Antigravity API error: {}", status.as_u16()));
            // Surface the error as-is; the console hint is diagnostics only.
            if let Some(url) = activation_url(&message).or_else(|| activation_url(&body_text)) {
                self.diagnostics.activation_required("Antigravity", url);
            }
            return Err(ProviderError::Upstream(message));
        }

        let payload: Value = response.json().await.map_err(|e| {
            ProviderError::Network(format!("Failed to parse Antigravity response: {e}"))
        })?;

        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse("Antigravity"));
        }
        Ok(text.to_string())
    }
}

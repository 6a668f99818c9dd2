use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod antigravity;
pub mod catalog;
pub mod diagnostics;
pub mod error;
pub mod gemini;
pub mod groq;
pub mod ollama;
pub mod openai;
pub mod registry;

pub use antigravity::AntigravityAdapter;
pub use catalog::{CATALOG, ModelDescriptor, ProviderDescriptor};
pub use diagnostics::{DiagnosticsSink, TracingDiagnostics, activation_url};
pub use error::ProviderError;
pub use gemini::GeminiAdapter;
pub use groq::GroqAdapter;
pub use ollama::OllamaAdapter;
pub use openai::OpenAiAdapter;
pub use registry::{AdapterRegistry, ProviderKind};

/// Effective per-call configuration produced by the resolver.
///
/// Built fresh for every call and never persisted as a whole; its fields live
/// under separate settings keys. Numeric parameters left `None` fall back to
/// per-adapter defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
    pub endpoint: Option<String>,
}

/// Uniform generate-text contract over one backend's wire protocol.
///
/// Adapters are stateless across calls. A call either returns non-empty text
/// or fails; an empty upstream reply is an error, never an empty success.
/// A missing required credential fails before any network I/O.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn generate_content(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, ProviderError>;
}

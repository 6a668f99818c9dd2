use crate::catalog::{self, ProviderDescriptor};
use crate::{
    AntigravityAdapter, GeminiAdapter, GroqAdapter, OllamaAdapter, OpenAiAdapter, ProviderAdapter,
};

/// The five backends a model id can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Gemini,
    Groq,
    OpenAi,
    Ollama,
    Antigravity,
}

impl ProviderKind {
    /// Map a model id to its provider by prefix.
    ///
    /// Anything without a recognized prefix routes to Gemini (bare Gemini
    /// model names carry no prefix at all). That fallback is a
    /// deliberate policy, not an error path: unknown ids must select Gemini
    /// rather than fail.
    pub fn from_model_id(model_id: &str) -> Self {
        if model_id.starts_with("groq-") {
            ProviderKind::Groq
        } else if model_id.starts_with("openai-") {
            ProviderKind::OpenAi
        } else if model_id.starts_with("ollama-") {
            ProviderKind::Ollama
        } else if model_id.starts_with("antigravity-") {
            ProviderKind::Antigravity
        } else {
            ProviderKind::Gemini
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Groq => "groq",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Antigravity => "antigravity",
        }
    }

    pub fn descriptor(&self) -> &'static ProviderDescriptor {
        catalog::descriptor(self.id()).expect("catalog covers every provider kind")
    }

    pub fn display_name(&self) -> &'static str {
        self.descriptor().display_name
    }

    /// Settings key this provider's credential is persisted under.
    pub fn credential_key(&self) -> &'static str {
        self.descriptor().credential_key
    }
}

/// Holds one adapter per provider and routes model ids to them.
pub struct AdapterRegistry {
    gemini: GeminiAdapter,
    groq: GroqAdapter,
    openai: OpenAiAdapter,
    ollama: OllamaAdapter,
    antigravity: AntigravityAdapter,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            gemini: GeminiAdapter::new(),
            groq: GroqAdapter::new(),
            openai: OpenAiAdapter::new(),
            ollama: OllamaAdapter::new(),
            antigravity: AntigravityAdapter::new(),
        }
    }

    pub fn with_gemini(mut self, adapter: GeminiAdapter) -> Self {
        self.gemini = adapter;
        self
    }

    pub fn with_groq(mut self, adapter: GroqAdapter) -> Self {
        self.groq = adapter;
        self
    }

    pub fn with_openai(mut self, adapter: OpenAiAdapter) -> Self {
        self.openai = adapter;
        self
    }

    pub fn with_ollama(mut self, adapter: OllamaAdapter) -> Self {
        self.ollama = adapter;
        self
    }

    pub fn with_antigravity(mut self, adapter: AntigravityAdapter) -> Self {
        self.antigravity = adapter;
        self
    }

    pub fn adapter(&self, kind: ProviderKind) -> &dyn ProviderAdapter {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::Groq => &self.groq,
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Ollama => &self.ollama,
            ProviderKind::Antigravity => &self.antigravity,
        }
    }

    pub fn adapter_for_model(&self, model_id: &str) -> &dyn ProviderAdapter {
        self.adapter(ProviderKind::from_model_id(model_id))
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Well-known settings keys.
//!
//! Credential keys are distinct per provider so that credentials coexist.
//! Theme/locale preference is owned by the UI surfaces and has no key here.

/// Gemini credential.
pub const API_KEY: &str = "apiKey";
/// Groq credential.
pub const GROQ_API_KEY: &str = "groqApiKey";
/// OpenAI credential.
pub const OPENAI_API_KEY: &str = "openaiApiKey";
/// Antigravity credential.
pub const ANTIGRAVITY_API_KEY: &str = "antigravityApiKey";
/// Ollama server URL; doubles as that provider's credential slot.
pub const OLLAMA_ENDPOINT: &str = "ollamaEndpoint";

/// Selected model id.
pub const API_MODEL: &str = "apiModel";
/// Active tone preset applied when a request does not name one.
pub const CURRENT_PRESET: &str = "currentPreset";
/// Target language for the translate action.
pub const DEFAULT_LANGUAGE: &str = "defaultLanguage";

pub const AUTO_CLOSE: &str = "settings.autoClose";
pub const SHOW_NOTIFICATIONS: &str = "settings.showNotifications";

use std::sync::Arc;

use textpilot_common::Result;
use textpilot_providers::{GenerationConfig, ProviderKind};
use textpilot_store::{SettingsStore, keys};

/// Built-in default model. Also the sentinel for call-time overrides: an
/// override equal to this value is treated as "not chosen" and defers to the
/// persisted selection.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Call-time parameter overrides. Anything left `None` falls back to the
/// persisted settings or, for the numeric knobs, to adapter defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOverrides {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Merges call-time overrides, persisted settings, and hard defaults into the
/// concrete configuration for one adapter call.
///
/// Resolution always succeeds: a missing credential resolves to `None` and is
/// only surfaced when the adapter is invoked.
pub struct ConfigResolver {
    settings: Arc<SettingsStore>,
}

impl ConfigResolver {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self { settings }
    }

    pub fn resolve(&self, overrides: &CallOverrides) -> Result<GenerationConfig> {
        let model = match overrides
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty() && *m != DEFAULT_MODEL)
        {
            Some(explicit) => explicit.to_string(),
            None => self
                .settings
                .get_string(keys::API_MODEL)?
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };

        let kind = ProviderKind::from_model_id(&model);
        let api_key = self
            .settings
            .get_string(kind.credential_key())?
            .filter(|k| !k.trim().is_empty());

        let endpoint = if kind == ProviderKind::Ollama {
            self.settings
                .get_string(keys::OLLAMA_ENDPOINT)?
                .filter(|e| !e.trim().is_empty())
        } else {
            None
        };

        Ok(GenerationConfig {
            api_key,
            model,
            temperature: overrides.temperature,
            top_p: overrides.top_p,
            max_tokens: overrides.max_tokens,
            endpoint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_with(settings: &[(&str, &str)]) -> ConfigResolver {
        let store = SettingsStore::in_memory().unwrap();
        for (key, value) in settings {
            store.set_string(key, *value).unwrap();
        }
        ConfigResolver::new(Arc::new(store))
    }

    #[test]
    fn empty_store_resolves_to_hard_defaults() {
        let resolver = resolver_with(&[]);
        let config = resolver.resolve(&CallOverrides::default()).unwrap();

        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_key, None);
        assert_eq!(config.endpoint, None);
    }

    #[test]
    fn resolution_is_idempotent() {
        let resolver = resolver_with(&[
            (keys::API_MODEL, "groq-llama-3.3-70b"),
            (keys::GROQ_API_KEY, "gsk-secret"),
        ]);

        let first = resolver.resolve(&CallOverrides::default()).unwrap();
        let second = resolver.resolve(&CallOverrides::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn persisted_model_selects_its_own_credential_key() {
        let resolver = resolver_with(&[
            (keys::API_MODEL, "groq-llama-3.3-70b"),
            (keys::API_KEY, "gemini-secret"),
            (keys::GROQ_API_KEY, "groq-secret"),
        ]);

        let config = resolver.resolve(&CallOverrides::default()).unwrap();
        assert_eq!(config.model, "groq-llama-3.3-70b");
        assert_eq!(config.api_key.as_deref(), Some("groq-secret"));
    }

    #[test]
    fn explicit_override_beats_persisted_model() {
        let resolver = resolver_with(&[
            (keys::API_MODEL, "groq-llama-3.3-70b"),
            (keys::API_KEY, "gemini-secret"),
        ]);

        let overrides = CallOverrides {
            model: Some("gemini-2.5-pro".to_string()),
            ..Default::default()
        };
        let config = resolver.resolve(&overrides).unwrap();

        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.api_key.as_deref(), Some("gemini-secret"));
    }

    #[test]
    fn sentinel_override_defers_to_persisted_model() {
        let resolver = resolver_with(&[(keys::API_MODEL, "openai-gpt-4o")]);

        let overrides = CallOverrides {
            model: Some(DEFAULT_MODEL.to_string()),
            ..Default::default()
        };
        let config = resolver.resolve(&overrides).unwrap();

        assert_eq!(config.model, "openai-gpt-4o");
    }

    #[test]
    fn missing_credential_is_not_a_resolution_error() {
        let resolver = resolver_with(&[(keys::API_MODEL, "openai-gpt-4o")]);
        let config = resolver.resolve(&CallOverrides::default()).unwrap();

        assert_eq!(config.api_key, None);
    }

    #[test]
    fn ollama_model_picks_up_endpoint_setting() {
        let resolver = resolver_with(&[
            (keys::API_MODEL, "ollama-llama3.2"),
            (keys::OLLAMA_ENDPOINT, "http://box:11434"),
        ]);

        let config = resolver.resolve(&CallOverrides::default()).unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("http://box:11434"));
    }

    #[test]
    fn numeric_overrides_pass_through() {
        let resolver = resolver_with(&[]);
        let overrides = CallOverrides {
            temperature: Some(0.2),
            top_p: Some(0.8),
            max_tokens: Some(64),
            ..Default::default()
        };

        let config = resolver.resolve(&overrides).unwrap();
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.top_p, Some(0.8));
        assert_eq!(config.max_tokens, Some(64));
    }
}

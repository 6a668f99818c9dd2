//! Static provider catalog, read-only at runtime.

/// One selectable model within a provider.
///
/// `api_model_name` is set where the catalog id differs from the name the
/// provider's API expects (Groq, OpenAI); adapters whose ids already match
/// the wire name (Gemini) or that strip a literal prefix (Ollama,
/// Antigravity) leave it `None`.
#[derive(Debug, Clone, Copy)]
pub struct ModelDescriptor {
    pub id: &'static str,
    pub display_name: &'static str,
    pub api_model_name: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
pub struct ProviderDescriptor {
    pub id: &'static str,
    pub display_name: &'static str,
    /// Settings key holding this provider's credential. Keys are distinct so
    /// credentials for different providers coexist.
    pub credential_key: &'static str,
    pub models: &'static [ModelDescriptor],
}

pub const CATALOG: &[ProviderDescriptor] = &[
    ProviderDescriptor {
        id: "gemini",
        display_name: "Gemini",
        credential_key: "apiKey",
        models: &[
            ModelDescriptor {
                id: "gemini-2.5-flash",
                display_name: "Gemini 2.5 Flash",
                api_model_name: None,
            },
            ModelDescriptor {
                id: "gemini-2.5-pro",
                display_name: "Gemini 2.5 Pro",
                api_model_name: None,
            },
            ModelDescriptor {
                id: "gemini-2.0-flash",
                display_name: "Gemini 2.0 Flash",
                api_model_name: None,
            },
        ],
    },
    ProviderDescriptor {
        id: "groq",
        display_name: "Groq",
        credential_key: "groqApiKey",
        models: &[
            ModelDescriptor {
                id: "groq-llama-3.3-70b",
                display_name: "Llama 3.3 70B (Groq)",
                api_model_name: Some("llama-3.3-70b-versatile"),
            },
            ModelDescriptor {
                id: "groq-llama-3.1-8b",
                display_name: "Llama 3.1 8B (Groq)",
                api_model_name: Some("llama-3.1-8b-instant"),
            },
        ],
    },
    ProviderDescriptor {
        id: "openai",
        display_name: "OpenAI",
        credential_key: "openaiApiKey",
        models: &[
            ModelDescriptor {
                id: "openai-gpt-4o",
                display_name: "GPT-4o",
                api_model_name: Some("gpt-4o"),
            },
            ModelDescriptor {
                id: "openai-gpt-4o-mini",
                display_name: "GPT-4o mini",
                api_model_name: Some("gpt-4o-mini"),
            },
        ],
    },
    ProviderDescriptor {
        id: "ollama",
        display_name: "Ollama",
        credential_key: "ollamaEndpoint",
        models: &[
            ModelDescriptor {
                id: "ollama-llama3.2",
                display_name: "Llama 3.2 (local)",
                api_model_name: None,
            },
            ModelDescriptor {
                id: "ollama-mistral",
                display_name: "Mistral (local)",
                api_model_name: None,
            },
        ],
    },
    ProviderDescriptor {
        id: "antigravity",
        display_name: "Antigravity",
        credential_key: "antigravityApiKey",
        models: &[ModelDescriptor {
            id: "antigravity-gemini-2.5-pro",
            display_name: "Gemini 2.5 Pro (Antigravity)",
            api_model_name: None,
        }],
    },
];

/// Look up a provider descriptor by id.
pub fn descriptor(provider_id: &str) -> Option<&'static ProviderDescriptor> {
    CATALOG.iter().find(|p| p.id == provider_id)
}

/// Translate a catalog model id to the provider's own API model name, if the
/// catalog defines a distinct one.
pub fn api_model_name(model_id: &str) -> Option<&'static str> {
    CATALOG
        .iter()
        .flat_map(|p| p.models.iter())
        .find(|m| m.id == model_id)
        .and_then(|m| m.api_model_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_keys_are_distinct() {
        for (i, a) in CATALOG.iter().enumerate() {
            for b in &CATALOG[i + 1..] {
                assert_ne!(a.credential_key, b.credential_key);
            }
        }
    }

    #[test]
    fn groq_models_translate_to_api_names() {
        assert_eq!(
            api_model_name("groq-llama-3.3-70b"),
            Some("llama-3.3-70b-versatile")
        );
        assert_eq!(api_model_name("openai-gpt-4o-mini"), Some("gpt-4o-mini"));
    }

    #[test]
    fn gemini_ids_are_already_api_names() {
        assert_eq!(api_model_name("gemini-2.5-flash"), None);
        assert_eq!(api_model_name("not-in-catalog"), None);
    }
}

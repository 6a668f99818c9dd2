use thiserror::Error;

/// Normalized failure shape shared by every provider adapter.
///
/// Message text is preserved end to end: the router surfaces these to the
/// caller unmodified, so `Display` output is the user-visible error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Required credential absent from the call configuration.
    #[error("{0} API key not configured")]
    MissingCredential(&'static str),

    /// HTTP 429. Retried with exponential backoff where the adapter's policy
    /// allows, then surfaced.
    #[error("{0}")]
    RateLimited(String),

    /// Non-OK upstream reply, message taken verbatim from the error body
    /// where available.
    #[error("{0}")]
    Upstream(String),

    /// The upstream call succeeded but produced no text.
    #[error("Empty response from {0} API")]
    EmptyResponse(&'static str),

    /// Network or response-parse failure.
    #[error("{0}")]
    Network(String),
}

impl ProviderError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Network(_))
    }
}

/// Pull the human-readable message out of a `{"error":{"message":...}}`
/// body. Gemini, Groq, and OpenAI all use this envelope for errors.
pub(crate) fn upstream_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(ToString::to_string)
}

//! Diagnostics hooks for provider-side hints that are not part of the error
//! contract itself.

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

/// Receiver for provider diagnostics. Adapters report hints here instead of
/// logging directly, so the sink can be swapped or silenced in tests.
pub trait DiagnosticsSink: Send + Sync {
    /// An upstream error indicated the API must be enabled in the cloud
    /// console before use. The error itself is still surfaced to the caller.
    fn activation_required(&self, provider: &'static str, url: &str);
}

/// Default sink: structured log output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn activation_required(&self, provider: &'static str, url: &str) {
        warn!(provider, url, "API is disabled for this project; enable it at the linked console page and retry");
    }
}

static ACTIVATION_URL: OnceLock<Regex> = OnceLock::new();

/// Extract the console activation URL from an "enable it by visiting <url>"
/// upstream error message. Returns `None` when the message carries no such
/// hint.
pub fn activation_url(message: &str) -> Option<&str> {
    let pattern = ACTIVATION_URL.get_or_init(|| {
        Regex::new(r"(?i)enable it by visiting\s+(https://\S+)")
            .expect("activation pattern is valid")
    });
    pattern
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches(['.', ',']))
}

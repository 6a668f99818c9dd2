use std::sync::Arc;

use textpilot_common::{ActionResponse, RequestEnvelope, Result, ShowResult};
use textpilot_config::{CallOverrides, ConfigResolver};
use textpilot_providers::{AdapterRegistry, GenerationConfig};
use textpilot_store::{HistoryStore, NewHistoryEntry, SettingsStore, keys};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::prompts;
use crate::relay::ContentRelay;

const DISPATCH_QUEUE_DEPTH: usize = 64;
const VALIDATION_PROMPT: &str = "Reply with the single word OK.";

/// Where a request came from. `surface` selects the relay target for the
/// finished result; `site` is recorded with the history entry.
#[derive(Debug, Clone, Default)]
pub struct Origin {
    pub surface: Option<String>,
    pub site: Option<String>,
}

/// One envelope plus its single-use response channel. The `oneshot` sender is
/// consumed by exactly one `send`, which is the exactly-once response
/// guarantee: the type makes a second response impossible, and a handler that
/// never responds surfaces to the caller as a closed channel, not a hang.
pub struct Dispatch {
    pub envelope: RequestEnvelope,
    pub origin: Origin,
    pub respond: oneshot::Sender<ActionResponse>,
}

/// Cloneable submission handle for UI surfaces.
#[derive(Clone)]
pub struct RouterHandle {
    tx: mpsc::Sender<Dispatch>,
}

impl RouterHandle {
    /// Submit an envelope and await its single correlated response.
    pub async fn submit(&self, envelope: RequestEnvelope, origin: Origin) -> ActionResponse {
        let (respond, rx) = oneshot::channel();
        let dispatch = Dispatch {
            envelope,
            origin,
            respond,
        };
        if self.tx.send(dispatch).await.is_err() {
            return ActionResponse::err("message router is not running");
        }
        rx.await
            .unwrap_or_else(|_| ActionResponse::err("message router dropped the request"))
    }
}

/// The background orchestrator: receives envelopes, sequences resolver →
/// registry → adapter, fans successful results out to the relay and the
/// history recorder, and answers the caller. Stateless between envelopes.
pub struct MessageRouter {
    settings: Arc<SettingsStore>,
    history: Arc<HistoryStore>,
    resolver: ConfigResolver,
    registry: Arc<AdapterRegistry>,
    relay: Arc<dyn ContentRelay>,
}

impl MessageRouter {
    pub fn new(
        settings: Arc<SettingsStore>,
        history: Arc<HistoryStore>,
        registry: Arc<AdapterRegistry>,
        relay: Arc<dyn ContentRelay>,
    ) -> Self {
        Self {
            resolver: ConfigResolver::new(settings.clone()),
            settings,
            history,
            registry,
            relay,
        }
    }

    /// Start the dispatch loop. Each envelope runs in its own task:
    /// concurrent requests interleave at await points and complete in
    /// completion order, with no dedup and no cap. Once dispatched, a request
    /// runs to success or failure; there is no abort path.
    pub fn spawn(self) -> RouterHandle {
        let (tx, mut rx) = mpsc::channel(DISPATCH_QUEUE_DEPTH);
        let router = Arc::new(self);
        tokio::spawn(async move {
            while let Some(dispatch) = rx.recv().await {
                let router = router.clone();
                tokio::spawn(async move { router.handle(dispatch).await });
            }
        });
        RouterHandle { tx }
    }

    async fn handle(&self, dispatch: Dispatch) {
        let Dispatch {
            envelope,
            origin,
            respond,
        } = dispatch;

        let response = match envelope {
            RequestEnvelope::WritingAction {
                action,
                preset,
                text,
            } => self.writing_action(action, preset, text, &origin).await,
            RequestEnvelope::QuickAsk { query, preset } => {
                self.quick_ask(query, preset, &origin).await
            }
            RequestEnvelope::ValidateConfig {
                provider,
                model,
                key,
            } => self.validate_config(&provider, model, key).await,
        };

        if respond.send(response).is_err() {
            debug!("caller went away before the response was delivered");
        }
    }

    async fn writing_action(
        &self,
        action: String,
        preset: Option<String>,
        text: String,
        origin: &Origin,
    ) -> ActionResponse {
        let preset = match self.effective_preset(preset) {
            Ok(preset) => preset,
            Err(e) => return ActionResponse::err(e.to_string()),
        };
        let language = self
            .settings
            .get_string(keys::DEFAULT_LANGUAGE)
            .ok()
            .flatten()
            .unwrap_or_else(|| prompts::DEFAULT_LANGUAGE.to_string());

        let prompt = prompts::writing_prompt(&action, &preset, &text, &language);
        self.generate_and_fan_out(&action, &prompt, &text, &preset, origin)
            .await
    }

    async fn quick_ask(
        &self,
        query: String,
        preset: Option<String>,
        origin: &Origin,
    ) -> ActionResponse {
        let preset = match self.effective_preset(preset) {
            Ok(preset) => preset,
            Err(e) => return ActionResponse::err(e.to_string()),
        };

        let prompt = prompts::quick_ask_prompt(&query, &preset);
        self.generate_and_fan_out("ask", &prompt, &query, &preset, origin)
            .await
    }

    /// The shared success path: adapter call, then relay + history fan-out.
    /// On failure at any stage the fan-out is skipped entirely, so the caller
    /// sees the error and nothing else happens.
    async fn generate_and_fan_out(
        &self,
        action: &str,
        prompt: &str,
        original: &str,
        preset: &str,
        origin: &Origin,
    ) -> ActionResponse {
        let config = match self.resolver.resolve(&CallOverrides::default()) {
            Ok(config) => config,
            Err(e) => return ActionResponse::err(e.to_string()),
        };

        let adapter = self.registry.adapter_for_model(&config.model);
        debug!(
            action,
            model = %config.model,
            provider = adapter.kind().id(),
            "dispatching to provider"
        );

        let result = match adapter.generate_content(prompt, &config).await {
            Ok(result) => result,
            Err(e) => return ActionResponse::err(e.to_string()),
        };

        // Fan-out. The history entry is written even if the relay fails (the
        // page may have navigated away); the adapter call happened either
        // way, and relay failures are visible in the logs.
        if let Some(surface) = origin.surface.as_deref() {
            let show = ShowResult {
                action: action.to_string(),
                original: original.to_string(),
                result: result.clone(),
            };
            if let Err(e) = self.relay.show_result(surface, show).await {
                warn!(surface, "failed to relay result to originating surface: {e}");
            }
        }

        let entry = NewHistoryEntry {
            action: action.to_string(),
            input_text: original.to_string(),
            output_text: result.clone(),
            preset: Some(preset.to_string()),
            site: origin.site.clone(),
        };
        if let Err(e) = self.history.record(entry) {
            warn!("failed to record history entry: {e}");
        }

        ActionResponse::ok(result)
    }

    /// Probe the supplied credential with one lightweight call. Routed by
    /// model prefix like live traffic; persisted settings and history stay
    /// untouched.
    async fn validate_config(&self, provider: &str, model: String, key: String) -> ActionResponse {
        let config = GenerationConfig {
            api_key: Some(key),
            model,
            ..Default::default()
        };
        let adapter = self.registry.adapter_for_model(&config.model);
        debug!(
            provider,
            model = %config.model,
            routed = adapter.kind().id(),
            "validating provider credential"
        );

        match adapter.generate_content(VALIDATION_PROMPT, &config).await {
            Ok(_) => ActionResponse::ok_empty(),
            Err(e) => ActionResponse::err(e.to_string()),
        }
    }

    fn effective_preset(&self, preset: Option<String>) -> Result<String> {
        if let Some(preset) = preset.filter(|p| !p.trim().is_empty()) {
            return Ok(preset);
        }
        Ok(self
            .settings
            .get_string(keys::CURRENT_PRESET)?
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| prompts::DEFAULT_PRESET.to_string()))
    }
}

use std::sync::Arc;

use textpilot_providers::AdapterRegistry;
use textpilot_store::{HistoryStore, SettingsStore};

use crate::dispatch::{MessageRouter, RouterHandle};
use crate::relay::SurfaceRegistry;

pub type SharedState = Arc<AppState>;

/// Everything the HTTP and WebSocket handlers need, wired together once at
/// startup.
pub struct AppState {
    pub settings: Arc<SettingsStore>,
    pub history: Arc<HistoryStore>,
    pub surfaces: Arc<SurfaceRegistry>,
    pub router: RouterHandle,
}

impl AppState {
    /// Assemble the pipeline and start the router's dispatch loop.
    pub fn new(
        settings: Arc<SettingsStore>,
        history: Arc<HistoryStore>,
        registry: AdapterRegistry,
    ) -> SharedState {
        let surfaces = Arc::new(SurfaceRegistry::new());
        let router = MessageRouter::new(
            settings.clone(),
            history.clone(),
            Arc::new(registry),
            surfaces.clone(),
        )
        .spawn();

        Arc::new(Self {
            settings,
            history,
            surfaces,
            router,
        })
    }
}

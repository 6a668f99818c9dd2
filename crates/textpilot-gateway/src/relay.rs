use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use textpilot_common::{ActionResponse, Error, Result, ShowResult};
use tokio::sync::mpsc;

const SURFACE_QUEUE_DEPTH: usize = 16;

/// Outbound frame pushed to a connected page surface.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum SurfaceFrame {
    /// Sent once on connect so the surface learns its id.
    #[serde(rename = "WELCOME")]
    Welcome { surface: String },

    /// Finished result for on-page display.
    #[serde(rename = "SHOW_RESULT")]
    ShowResult(ShowResult),

    /// Correlated answer to an envelope the surface submitted over its
    /// socket. `id` echoes the submission's correlation id.
    #[serde(rename = "RESPONSE")]
    Response {
        id: Option<String>,
        response: ActionResponse,
    },
}

/// Delivery of a finished result to the surface that originated a request.
#[async_trait]
pub trait ContentRelay: Send + Sync {
    async fn show_result(&self, surface: &str, result: ShowResult) -> Result<()>;
}

/// Connected page surfaces, keyed by the id handed out at registration.
///
/// Senders are cheap clones; the socket task owns the receiving end and the
/// entry disappears when the surface disconnects.
#[derive(Default)]
pub struct SurfaceRegistry {
    surfaces: DashMap<String, mpsc::Sender<SurfaceFrame>>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> (String, mpsc::Receiver<SurfaceFrame>) {
        let surface = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(SURFACE_QUEUE_DEPTH);
        self.surfaces.insert(surface.clone(), tx);
        (surface, rx)
    }

    pub fn unregister(&self, surface: &str) {
        self.surfaces.remove(surface);
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub async fn push(&self, surface: &str, frame: SurfaceFrame) -> Result<()> {
        let sender = self
            .surfaces
            .get(surface)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::Relay(format!("surface '{surface}' is not connected")))?;

        sender
            .send(frame)
            .await
            .map_err(|_| Error::Relay(format!("surface '{surface}' went away")))
    }
}

#[async_trait]
impl ContentRelay for SurfaceRegistry {
    async fn show_result(&self, surface: &str, result: ShowResult) -> Result<()> {
        self.push(surface, SurfaceFrame::ShowResult(result)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn show_result_frame_has_the_relay_wire_shape() {
        let frame = SurfaceFrame::ShowResult(ShowResult {
            action: "grammar".to_string(),
            original: "original text".to_string(),
            result: "Improved Text".to_string(),
        });

        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({
                "type": "SHOW_RESULT",
                "payload": {
                    "action": "grammar",
                    "original": "original text",
                    "result": "Improved Text"
                }
            })
        );
    }

    #[tokio::test]
    async fn push_delivers_to_the_registered_surface_only() {
        let registry = SurfaceRegistry::new();
        let (surface, mut rx) = registry.register();

        registry
            .push(&surface, SurfaceFrame::Welcome { surface: surface.clone() })
            .await
            .unwrap();
        assert!(matches!(rx.recv().await, Some(SurfaceFrame::Welcome { .. })));

        let err = registry
            .push("no-such-surface", SurfaceFrame::Welcome { surface: "x".into() })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not connected"));
    }

    #[tokio::test]
    async fn unregister_disconnects_the_surface() {
        let registry = SurfaceRegistry::new();
        let (surface, _rx) = registry.register();
        assert_eq!(registry.len(), 1);

        registry.unregister(&surface);
        assert!(registry.is_empty());

        let result = registry
            .show_result(
                &surface,
                ShowResult {
                    action: "improve".into(),
                    original: "a".into(),
                    result: "b".into(),
                },
            )
            .await;
        assert!(result.is_err());
    }
}

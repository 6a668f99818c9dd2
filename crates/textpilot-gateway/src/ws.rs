use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{Sink, SinkExt, StreamExt};
use serde::Deserialize;
use textpilot_common::RequestEnvelope;
use tracing::{debug, info};

use crate::dispatch::Origin;
use crate::relay::SurfaceFrame;
use crate::state::SharedState;

/// Inbound socket frame: a request envelope plus a caller-chosen correlation
/// id (echoed on the RESPONSE frame) and the page's site for history.
#[derive(Debug, Deserialize)]
struct SurfaceEnvelope {
    id: Option<String>,
    site: Option<String>,
    #[serde(flatten)]
    envelope: RequestEnvelope,
}

/// GET /ws — page-surface socket. The surface receives a WELCOME with its
/// id, then SHOW_RESULT pushes, plus RESPONSE frames for envelopes it
/// submits.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (surface, mut frames) = state.surfaces.register();
    info!(surface, "page surface connected");

    let (mut sink, mut stream) = socket.split();

    let welcome = SurfaceFrame::Welcome {
        surface: surface.clone(),
    };
    if send_frame(&mut sink, &welcome).await.is_err() {
        state.surfaces.unregister(&surface);
        return;
    }

    loop {
        tokio::select! {
            frame = frames.recv() => {
                let Some(frame) = frame else { break };
                if send_frame(&mut sink, &frame).await.is_err() {
                    break;
                }
            }
            message = stream.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        handle_incoming(&state, &surface, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ping/pong/binary: nothing to do
                    Some(Err(e)) => {
                        debug!(surface, "socket error: {e}");
                        break;
                    }
                }
            }
        }
    }

    state.surfaces.unregister(&surface);
    info!(surface, "page surface disconnected");
}

/// Parse and dispatch one submitted envelope. The router call runs in its own
/// task so a slow provider never blocks this surface's socket loop.
async fn handle_incoming(state: &SharedState, surface: &str, text: &str) {
    let incoming: SurfaceEnvelope = match serde_json::from_str(text) {
        Ok(incoming) => incoming,
        Err(e) => {
            let frame = SurfaceFrame::Response {
                id: None,
                response: textpilot_common::ActionResponse::err(format!(
                    "malformed envelope: {e}"
                )),
            };
            let _ = state.surfaces.push(surface, frame).await;
            return;
        }
    };

    let origin = Origin {
        surface: Some(surface.to_string()),
        site: incoming.site,
    };
    let router = state.router.clone();
    let surfaces = state.surfaces.clone();
    let surface = surface.to_string();
    let id = incoming.id;

    tokio::spawn(async move {
        let response = router.submit(incoming.envelope, origin).await;
        let frame = SurfaceFrame::Response { id, response };
        if let Err(e) = surfaces.push(&surface, frame).await {
            debug!(surface, "response frame undeliverable: {e}");
        }
    });
}

async fn send_frame(
    sink: &mut (impl Sink<Message, Error = axum::Error> + Unpin),
    frame: &SurfaceFrame,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(frame).expect("surface frames serialize");
    sink.send(Message::Text(text.into())).await
}

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use tokio::sync::broadcast::error::RecvError;

use super::send_json;
use crate::state::AppState;

/// `GET /ws`: Overlay frame stream.
///
/// Every [`OverlayMessage`](jarcast_sdk::objects::OverlayMessage) published
/// after the viewer connects is forwarded as a JSON text frame. There is no
/// replay; a viewer that connects mid-notification sees the next one.
pub(super) async fn overlay_ws(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_overlay_ws(socket, state))
}

async fn handle_overlay_ws(mut socket: WebSocket, state: AppState) {
    let mut frames = state.overlay.subscribe();
    tracing::info!(viewers = state.overlay.viewer_count(), "Overlay viewer connected");

    loop {
        tokio::select! {
            result = frames.recv() => {
                match result {
                    Ok(frame) => {
                        if send_json(&mut socket, &frame).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Overlay viewer lagged, frames dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::info!("Overlay viewer disconnected");
}

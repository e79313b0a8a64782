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

/// `GET /feed/ws`: Donation feed stream.
///
/// The first frame is an `init` message with the recent donations, followed
/// by a `new_donation` frame per donation.
pub(super) async fn feed_ws(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_feed_ws(socket, state))
}

async fn handle_feed_ws(mut socket: WebSocket, state: AppState) {
    let (init, mut updates) = state.feed.subscribe_with_init().await;
    if send_json(&mut socket, &init).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            result = updates.recv() => {
                match result {
                    Ok(message) => {
                        if send_json(&mut socket, &message).await.is_err() {
                            return;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Feed client lagged, resending snapshot");
                        let (init, fresh) = state.feed.subscribe_with_init().await;
                        updates = fresh;
                        if send_json(&mut socket, &init).await.is_err() {
                            return;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    let _ = socket.send(Message::Close(None)).await;
}

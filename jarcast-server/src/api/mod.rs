//! HTTP and WebSocket endpoints.
//!
//! # Endpoints
//!
//! - `GET  /ws`             – overlay frame stream
//! - `GET  /feed/ws`        – recent donations, then live updates
//! - `POST /test-donation`  – show a test donation immediately
//! - `GET  /media/{*path}`  – files from the media directory

use axum::extract::ws::{Message, WebSocket};
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

mod feed_ws;
mod media;
mod overlay_ws;
mod test_donation;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws", get(overlay_ws::overlay_ws))
        .route("/feed/ws", get(feed_ws::feed_ws))
        .route("/test-donation", post(test_donation::test_donation))
        .route("/media/{*path}", get(media::serve_media))
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

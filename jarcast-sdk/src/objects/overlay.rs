//! WebSocket message types for the overlay stream.
//!
//! The `GET /ws` endpoint pushes [`OverlayMessage`] JSON frames to every
//! connected overlay page. Clients interpret `duration` locally, so a
//! frame is fire-and-forget from the server's point of view.

use serde::{Deserialize, Serialize};

/// URL prefix under which the server exposes the media directory.
pub const MEDIA_URL_PREFIX: &str = "/media/";

/// Server-to-overlay WebSocket message.
///
/// Serialized as an internally-tagged JSON object:
///
/// ```json
/// {"type":"show_media","image":"/media/big.gif","audio":"/media/big.mp3","duration":5000}
/// {"type":"clear"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayMessage {
    /// Show an image and optionally play a sound alongside it.
    ShowMedia {
        image: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        audio: Option<String>,
        /// Display time in milliseconds.
        duration: u64,
    },

    /// Hide whatever is currently displayed.
    Clear,
}

impl OverlayMessage {
    /// Build a `show_media` frame from media references relative to the
    /// media root.
    pub fn show_media(image_ref: &str, audio_ref: Option<&str>, duration_ms: u64) -> Self {
        OverlayMessage::ShowMedia {
            image: media_url(image_ref),
            audio: audio_ref.map(media_url),
            duration: duration_ms,
        }
    }
}

fn media_url(media_ref: &str) -> String {
    format!(
        "{MEDIA_URL_PREFIX}{}",
        media_ref.trim_start_matches('/')
    )
}

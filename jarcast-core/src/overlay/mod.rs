//! Overlay sink abstraction and the broadcast implementation.

use jarcast_sdk::objects::OverlayMessage;
use tokio::sync::broadcast;
use tracing::debug;

/// Display surface for notifications.
///
/// Calls are fire-and-forget: the sink has no notion of when a
/// notification ends, so sequencing is the caller's job.
pub trait OverlaySink: Send + Sync {
    /// Show `image` (and play `sound`, if any) for `duration_ms`.
    fn show(&self, image: &str, sound: Option<&str>, duration_ms: u64);

    /// Hide whatever is currently displayed.
    fn clear(&self);
}

/// Overlay sink that fans [`OverlayMessage`] frames out to every connected
/// viewer through a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastOverlay {
    tx: broadcast::Sender<OverlayMessage>,
}

impl BroadcastOverlay {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe a new viewer.
    pub fn subscribe(&self) -> broadcast::Receiver<OverlayMessage> {
        self.tx.subscribe()
    }

    /// Number of connected viewers.
    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn publish(&self, message: OverlayMessage) {
        // No viewers is not an error; the frame is simply lost.
        match self.tx.send(message) {
            Ok(viewers) => debug!(viewers, "Published overlay frame"),
            Err(_) => debug!("No overlay viewers connected, frame dropped"),
        }
    }
}

impl OverlaySink for BroadcastOverlay {
    fn show(&self, image: &str, sound: Option<&str>, duration_ms: u64) {
        self.publish(OverlayMessage::show_media(image, sound, duration_ms));
    }

    fn clear(&self) {
        self.publish(OverlayMessage::Clear);
    }
}

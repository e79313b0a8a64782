//! Application state shared across all request handlers.

use jarcast_core::events::ManualTriggerSender;
use jarcast_core::overlay::BroadcastOverlay;
use jarcast_core::processors::DonationFeed;
use std::path::PathBuf;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc
/// or is a channel handle).
#[derive(Clone)]
pub struct AppState {
    /// Overlay frames fan out from here to every `/ws` viewer.
    pub overlay: BroadcastOverlay,
    /// Recent donations for `/feed/ws`.
    pub feed: Arc<DonationFeed>,
    /// Manual test donations, shown immediately.
    pub manual_triggers: ManualTriggerSender,
    /// Directory served under `/media/`.
    pub media_root: Arc<PathBuf>,
}

impl AppState {
    pub fn new(
        overlay: BroadcastOverlay,
        feed: Arc<DonationFeed>,
        manual_triggers: ManualTriggerSender,
        media_root: PathBuf,
    ) -> Self {
        Self {
            overlay,
            feed,
            manual_triggers,
            media_root: Arc::new(media_root),
        }
    }
}

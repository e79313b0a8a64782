//! Channel factories and handles.

use super::types::ManualTrigger;
use crate::entities::Donation;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tracing::warn;

/// Default buffer size for bounded event channels.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Buffer size of the overlay broadcast; slow viewers lag instead of
/// holding back the sequencer.
pub const OVERLAY_BROADCAST_BUFFER: usize = 64;

/// Sender handle for donations forwarded to downstream workers.
pub type DonationSender = mpsc::Sender<Donation>;
/// Receiver handle for donations forwarded to downstream workers.
pub type DonationReceiver = mpsc::Receiver<Donation>;

/// Sender handle for manual test donations.
pub type ManualTriggerSender = mpsc::Sender<ManualTrigger>;
/// Receiver handle for manual test donations.
pub type ManualTriggerReceiver = mpsc::Receiver<ManualTrigger>;

/// Create a bounded donation channel for a downstream worker.
pub fn donation_channel() -> (DonationSender, DonationReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create the channel manual triggers travel through.
///
/// The sender may be used from a plain OS thread via `blocking_send`.
pub fn manual_trigger_channel() -> (ManualTriggerSender, ManualTriggerReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Producer side of the notification FIFO.
///
/// Cloneable and cheap; every clone feeds the same sequencer. Enqueueing
/// never blocks and never drops while the sequencer is alive.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: mpsc::UnboundedSender<Donation>,
    pending: Arc<AtomicUsize>,
}

/// Consumer side of the notification FIFO, owned by the sequencer.
#[derive(Debug)]
pub struct NotificationQueueReceiver {
    rx: mpsc::UnboundedReceiver<Donation>,
    pending: Arc<AtomicUsize>,
}

/// Create the notification FIFO.
pub fn notification_queue() -> (NotificationQueue, NotificationQueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pending = Arc::new(AtomicUsize::new(0));
    (
        NotificationQueue {
            tx,
            pending: pending.clone(),
        },
        NotificationQueueReceiver { rx, pending },
    )
}

impl NotificationQueue {
    /// Append a donation to the FIFO.
    pub fn enqueue(&self, donation: Donation) {
        self.pending.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.tx.send(donation) {
            self.pending.fetch_sub(1, Ordering::Relaxed);
            warn!(donation = %e.0, "Notification queue closed, donation not queued");
        }
    }

    /// Number of donations waiting to be displayed.
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationQueueReceiver {
    /// Wait for the next donation; `None` once every producer is gone.
    ///
    /// Cancel-safe.
    pub async fn recv(&mut self) -> Option<Donation> {
        let donation = self.rx.recv().await?;
        self.pending.fetch_sub(1, Ordering::Relaxed);
        Some(donation)
    }

    /// Take the next donation if one is already waiting.
    pub fn try_recv(&mut self) -> Option<Donation> {
        let donation = self.rx.try_recv().ok()?;
        self.pending.fetch_sub(1, Ordering::Relaxed);
        Some(donation)
    }
}

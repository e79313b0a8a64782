//! NotificationSequencer processor.
//!
//! The NotificationSequencer is responsible for:
//! - Owning the notification FIFO fed by the poller
//! - Displaying queued donations strictly one at a time, holding each on
//!   screen for the display duration plus a buffer before the next
//! - Letting manual triggers bypass the FIFO via `show_immediately`
//!
//! The overlay may be a stateless broadcast, so the post-display sleep is
//! what keeps two notifications from overlapping.

use crate::entities::Donation;
use crate::events::{NotificationQueue, NotificationQueueReceiver, notification_queue};
use crate::media::{MediaSelection, MediaSelector};
use crate::overlay::OverlaySink;
use crate::utils::shutdown::wait_for_shutdown;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Errors that can occur while displaying a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// No rule matched and the global image pool is empty
    #[error("no media available for donation of {amount}")]
    NoMediaAvailable { amount: i64 },
}

/// Selects media for a donation and pushes it to the overlay.
///
/// Shared between the sequencer's consumer loop and manual trigger paths.
pub struct NotificationPresenter {
    selector: Arc<MediaSelector>,
    sink: Arc<dyn OverlaySink>,
    display_duration: Duration,
}

impl NotificationPresenter {
    pub fn new(
        selector: Arc<MediaSelector>,
        sink: Arc<dyn OverlaySink>,
        display_duration: Duration,
    ) -> Self {
        Self {
            selector,
            sink,
            display_duration,
        }
    }

    pub fn display_duration(&self) -> Duration {
        self.display_duration
    }

    /// Show `donation` right now, regardless of what the queue is doing.
    pub fn show_immediately(&self, donation: &Donation) -> Result<MediaSelection, NotifyError> {
        let Some(selection) = self.selector.select(Some(donation.amount)) else {
            return Err(NotifyError::NoMediaAvailable {
                amount: donation.amount,
            });
        };

        info!(
            %donation,
            image = %selection.image,
            sound = ?selection.sound,
            "Showing notification"
        );
        self.sink.show(
            &selection.image,
            selection.sound.as_deref(),
            self.display_duration.as_millis() as u64,
        );
        Ok(selection)
    }

    /// Hide whatever the overlay currently shows.
    pub fn clear(&self) {
        self.sink.clear();
    }
}

struct RunningConsumer {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<NotificationQueueReceiver>,
}

/// Single-consumer ordered display of queued donations.
///
/// Construct once and hand [`queue()`](NotificationSequencer::queue)
/// clones to producers. `start`/`stop` may be called repeatedly; queued
/// donations survive a stop.
pub struct NotificationSequencer {
    presenter: Arc<NotificationPresenter>,
    queue: NotificationQueue,
    display_buffer: Duration,
    receiver: Option<NotificationQueueReceiver>,
    running: Option<RunningConsumer>,
}

impl NotificationSequencer {
    pub fn new(presenter: Arc<NotificationPresenter>, display_buffer: Duration) -> Self {
        let (queue, receiver) = notification_queue();
        Self {
            presenter,
            queue,
            display_buffer,
            receiver: Some(receiver),
            running: None,
        }
    }

    /// A producer handle for the FIFO.
    pub fn queue(&self) -> NotificationQueue {
        self.queue.clone()
    }

    pub fn presenter(&self) -> Arc<NotificationPresenter> {
        self.presenter.clone()
    }

    /// Append `donation` to the FIFO.
    pub fn enqueue(&self, donation: Donation) {
        self.queue.enqueue(donation);
    }

    /// Bypass the FIFO and show `donation` now.
    pub fn show_immediately(&self, donation: &Donation) -> Result<MediaSelection, NotifyError> {
        self.presenter.show_immediately(donation)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Spawn the consumer loop. No-op if already running.
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }
        let Some(receiver) = self.receiver.take() else {
            error!("NotificationSequencer queue receiver lost, cannot start");
            return;
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_consumer(
            self.presenter.clone(),
            receiver,
            self.display_buffer,
            shutdown_rx,
        ));
        self.running = Some(RunningConsumer {
            shutdown_tx,
            handle,
        });
        info!("NotificationSequencer started");
    }

    /// Stop the consumer loop and wait for it to exit. No-op if stopped.
    ///
    /// Interrupts a pending wait or post-display sleep; nothing is shown
    /// after this returns.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        let _ = running.shutdown_tx.send(true);
        match running.handle.await {
            Ok(receiver) => self.receiver = Some(receiver),
            Err(e) => error!(error = %e, "NotificationSequencer consumer task failed"),
        }
        info!("NotificationSequencer stopped");
    }
}

async fn run_consumer(
    presenter: Arc<NotificationPresenter>,
    mut receiver: NotificationQueueReceiver,
    display_buffer: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> NotificationQueueReceiver {
    let hold = presenter.display_duration() + display_buffer;

    loop {
        let donation = tokio::select! {
            biased;

            _ = wait_for_shutdown(&mut shutdown_rx) => break,

            next = receiver.recv() => match next {
                Some(donation) => donation,
                None => {
                    info!("Notification queue closed");
                    break;
                }
            },
        };

        if let Err(e) = presenter.show_immediately(&donation) {
            warn!(%donation, error = %e, "Dropping notification");
            continue;
        }

        debug!(hold_ms = hold.as_millis() as u64, "Holding overlay for notification");
        tokio::select! {
            biased;

            _ = wait_for_shutdown(&mut shutdown_rx) => break,

            _ = tokio::time::sleep(hold) => {}
        }
    }

    receiver
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaRule;
    use crate::media::MediaLibrary;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum SinkCall {
        Show { image: String, at: Instant },
        Clear,
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<SinkCall>>,
    }

    impl RecordingSink {
        fn shown(&self) -> Vec<(String, Instant)> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter_map(|c| match c {
                    SinkCall::Show { image, at } => Some((image.clone(), *at)),
                    SinkCall::Clear => None,
                })
                .collect()
        }
    }

    impl OverlaySink for RecordingSink {
        fn show(&self, image: &str, _sound: Option<&str>, _duration_ms: u64) {
            self.calls.lock().unwrap().push(SinkCall::Show {
                image: image.to_owned(),
                at: Instant::now(),
            });
        }

        fn clear(&self) {
            self.calls.lock().unwrap().push(SinkCall::Clear);
        }
    }

    const DURATION: Duration = Duration::from_millis(5000);
    const BUFFER: Duration = Duration::from_millis(500);

    /// Every amount maps to an image named after the amount.
    fn sequencer_with(rules: Vec<MediaRule>) -> (NotificationSequencer, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let selector = Arc::new(MediaSelector::new(rules, MediaLibrary::default()));
        let presenter = Arc::new(NotificationPresenter::new(selector, sink.clone(), DURATION));
        (NotificationSequencer::new(presenter, BUFFER), sink)
    }

    fn per_amount_rules(amounts: &[i64]) -> Vec<MediaRule> {
        amounts
            .iter()
            .map(|&a| MediaRule::new(a, Some(a)).with_images([a.to_string()]))
            .collect()
    }

    async fn wait_for_shows(sink: &RecordingSink, count: usize) {
        while sink.shown().len() < count {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_donations_never_overlap() {
        let (mut sequencer, sink) = sequencer_with(per_amount_rules(&[100, 200, 300]));
        sequencer.enqueue(Donation::new(100));
        sequencer.enqueue(Donation::new(200));
        sequencer.enqueue(Donation::new(300));
        assert_eq!(sequencer.queue_len(), 3);

        sequencer.start();
        wait_for_shows(&sink, 3).await;
        sequencer.stop().await;

        let shown = sink.shown();
        let images: Vec<&str> = shown.iter().map(|(i, _)| i.as_str()).collect();
        assert_eq!(images, vec!["100", "200", "300"]);
        for pair in shown.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= DURATION + BUFFER);
        }
        assert_eq!(sequencer.queue_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_immediately_bypasses_queue() {
        let (mut sequencer, sink) = sequencer_with(per_amount_rules(&[100, 999]));
        sequencer.enqueue(Donation::new(100));

        sequencer
            .show_immediately(&Donation::new(999).with_donor_name("Test User"))
            .unwrap();

        sequencer.start();
        wait_for_shows(&sink, 2).await;
        sequencer.stop().await;

        let images: Vec<String> = sink.shown().into_iter().map(|(i, _)| i).collect();
        assert_eq!(images, vec!["999", "100"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_donation_without_media_is_dropped() {
        let (mut sequencer, sink) = sequencer_with(per_amount_rules(&[200]));
        sequencer.enqueue(Donation::new(1));
        sequencer.enqueue(Donation::new(200));

        sequencer.start();
        wait_for_shows(&sink, 1).await;
        sequencer.stop().await;

        let images: Vec<String> = sink.shown().into_iter().map(|(i, _)| i).collect();
        assert_eq!(images, vec!["200"]);
        assert!(matches!(
            sequencer.show_immediately(&Donation::new(1)),
            Err(NotifyError::NoMediaAvailable { amount: 1 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_hold_and_keeps_backlog() {
        let (mut sequencer, sink) = sequencer_with(per_amount_rules(&[100, 200]));
        sequencer.enqueue(Donation::new(100));
        sequencer.enqueue(Donation::new(200));

        sequencer.start();
        wait_for_shows(&sink, 1).await;
        let stopped_at = Instant::now();
        sequencer.stop().await;
        assert!(Instant::now() - stopped_at < DURATION);
        assert!(!sequencer.is_running());

        tokio::time::sleep(DURATION * 3).await;
        assert_eq!(sink.shown().len(), 1);
        assert_eq!(sequencer.queue_len(), 1);

        sequencer.start();
        wait_for_shows(&sink, 2).await;
        sequencer.stop().await;
        sequencer.stop().await;
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (mut sequencer, _sink) = sequencer_with(Vec::new());
        sequencer.start();
        sequencer.start();
        assert!(sequencer.is_running());
        sequencer.stop().await;
        assert!(!sequencer.is_running());
    }
}

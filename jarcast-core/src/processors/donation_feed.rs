//! DonationFeed processor.
//!
//! Keeps the most recent donations for overlays that list them, and pushes
//! every new one to connected feed clients.

use crate::entities::Donation;
use crate::events::DonationReceiver;
use crate::utils::shutdown::wait_for_shutdown;
use jarcast_sdk::objects::{FeedDonation, FeedMessage};
use kanau::processor::Processor;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast, watch};
use tracing::{debug, info};

/// Broadcast buffer for live feed updates.
const FEED_BROADCAST_BUFFER: usize = 64;

/// Bounded in-memory history of recent donations.
pub struct DonationFeed {
    capacity: usize,
    donations: RwLock<VecDeque<FeedDonation>>,
    updates: broadcast::Sender<FeedMessage>,
}

impl DonationFeed {
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new(capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(FEED_BROADCAST_BUFFER);
        Self {
            capacity: capacity.max(1),
            donations: RwLock::new(VecDeque::with_capacity(capacity)),
            updates,
        }
    }

    /// Recent donations, oldest first.
    pub async fn snapshot(&self) -> Vec<FeedDonation> {
        self.donations.read().await.iter().cloned().collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedMessage> {
        self.updates.subscribe()
    }

    /// The `init` message for a new client plus its live receiver, taken
    /// under one lock. Each donation shows up in exactly one of the two.
    pub async fn subscribe_with_init(&self) -> (FeedMessage, broadcast::Receiver<FeedMessage>) {
        let donations = self.donations.read().await;
        let updates = self.updates.subscribe();
        let init = FeedMessage::Init {
            donations: donations.iter().cloned().collect(),
        };
        (init, updates)
    }

    pub async fn clear(&self) {
        self.donations.write().await.clear();
    }

    pub fn to_feed_donation(donation: &Donation) -> FeedDonation {
        FeedDonation {
            donor_name: donation.donor_display().to_owned(),
            amount: donation.amount_major(),
            comment: donation.comment.clone().unwrap_or_default(),
            timestamp: donation.timestamp.unix_timestamp(),
        }
    }
}

impl Default for DonationFeed {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl Processor<Donation> for DonationFeed {
    type Output = ();
    type Error = Infallible;

    async fn process(&self, donation: Donation) -> Result<(), Infallible> {
        let entry = Self::to_feed_donation(&donation);
        let mut donations = self.donations.write().await;
        while donations.len() >= self.capacity {
            donations.pop_front();
        }
        donations.push_back(entry.clone());

        // Sent under the write lock so it pairs with `subscribe_with_init`.
        // No connected clients is fine.
        let _ = self
            .updates
            .send(FeedMessage::NewDonation { donation: entry });
        Ok(())
    }
}

/// Drains forwarded donations into a [`DonationFeed`].
pub struct DonationFeedRunner {
    feed: Arc<DonationFeed>,
    donation_rx: DonationReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl DonationFeedRunner {
    pub fn new(
        feed: Arc<DonationFeed>,
        donation_rx: DonationReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            feed,
            donation_rx,
            shutdown_rx,
        }
    }

    pub async fn run(mut self) {
        info!("DonationFeed started");

        loop {
            tokio::select! {
                biased;

                _ = wait_for_shutdown(&mut self.shutdown_rx) => {
                    info!("DonationFeed received shutdown signal");
                    break;
                }

                donation = self.donation_rx.recv() => {
                    let Some(donation) = donation else {
                        info!("Donation channel closed");
                        break;
                    };
                    debug!(%donation, "Recording donation in feed");
                    let _ = self.feed.process(donation).await;
                }
            }
        }

        info!("DonationFeed shutdown complete");
    }
}

//! Processors that move donations from the ledger to the screen.
//!
//! - `DonationPoller`: polls the ledger, emits each new donation once into
//!   the notification queue and the registered hooks
//! - `NotificationSequencer`: drains the queue, one overlay notification at
//!   a time
//! - `ManualTriggerRunner`: shows manual test donations immediately
//! - `DonationFeed`: keeps recent donations for feed clients

pub mod donation_feed;
pub mod donation_poller;
pub mod manual_trigger;
pub mod notification_sequencer;

pub use donation_feed::{DonationFeed, DonationFeedRunner};
pub use donation_poller::{DonationPoller, PollerError};
pub use manual_trigger::ManualTriggerRunner;
pub use notification_sequencer::{NotificationPresenter, NotificationSequencer, NotifyError};

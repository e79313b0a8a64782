//! Channels and messages connecting the pipeline stages.
//!
//! # Flow
//!
//! 1. `DonationPoller` pushes accepted donations into the
//!    [`NotificationQueue`] and fans them out to downstream hooks, which
//!    usually forward them over a [`DonationSender`].
//! 2. `NotificationSequencer` drains the queue one donation at a time.
//! 3. Manual triggers arrive as [`ManualTrigger`] messages from the console
//!    thread or the HTTP surface and bypass the queue.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, DonationReceiver, DonationSender, ManualTriggerReceiver,
    ManualTriggerSender, NotificationQueue, NotificationQueueReceiver,
    OVERLAY_BROADCAST_BUFFER, donation_channel, manual_trigger_channel, notification_queue,
};
pub use types::{ManualTrigger, TriggerParseError};

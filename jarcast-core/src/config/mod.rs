//! Runtime configuration types.
//!
//! These are the validated values the processors run with. Reading and
//! validating the config file is the server crate's job.

mod feed;
mod ledger;
mod media;
mod music;
mod poller;

pub use feed::FeedConfig;
pub use ledger::LedgerConfig;
pub use media::{MediaConfig, MediaRule};
pub use music::MusicQueueConfig;
pub use poller::PollerConfig;

//! Donation hooks.
//!
//! A hook is a named callback the poller runs for every new donation, after
//! the donation has been queued for display. Hooks run in registration
//! order; a failing or panicking hook is logged and skipped.

pub mod music_queue;

use crate::entities::Donation;
use crate::events::DonationSender;
use compact_str::CompactString;
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;

pub use music_queue::{MusicQueue, MusicQueueError, MusicQueueRunner, QueueItem};

#[derive(Debug, Error)]
pub enum HookError {
    #[error("{0}")]
    Failed(String),

    #[error("receiving worker is gone")]
    ChannelClosed,

    #[error("receiving worker is not keeping up")]
    ChannelFull,
}

type HookFn = dyn Fn(&Donation) -> Result<(), HookError> + Send + Sync;

/// A named donation callback.
pub struct DonationHook {
    name: CompactString,
    callback: Box<HookFn>,
}

impl DonationHook {
    pub fn new<F>(name: impl Into<CompactString>, callback: F) -> Self
    where
        F: Fn(&Donation) -> Result<(), HookError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            callback: Box::new(callback),
        }
    }

    /// A hook that hands each donation to an async worker over `tx`.
    ///
    /// Never blocks the poll cycle; a full channel is reported as an error.
    pub fn forward(name: impl Into<CompactString>, tx: DonationSender) -> Self {
        Self::new(name, move |donation: &Donation| {
            tx.try_send(donation.clone()).map_err(|e| match e {
                TrySendError::Full(_) => HookError::ChannelFull,
                TrySendError::Closed(_) => HookError::ChannelClosed,
            })
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, donation: &Donation) -> Result<(), HookError> {
        (self.callback)(donation)
    }
}

impl fmt::Debug for DonationHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DonationHook")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_forward_hook_delivers_and_reports_backpressure() {
        let (tx, mut rx) = mpsc::channel(1);
        let hook = DonationHook::forward("feed", tx);

        hook.call(&Donation::new(100)).unwrap();
        assert!(matches!(
            hook.call(&Donation::new(200)),
            Err(HookError::ChannelFull)
        ));
        assert_eq!(rx.recv().await.unwrap().amount, 100);

        drop(rx);
        assert!(matches!(
            hook.call(&Donation::new(300)),
            Err(HookError::ChannelClosed)
        ));
    }
}

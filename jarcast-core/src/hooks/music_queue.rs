//! Music request queue.
//!
//! Donors can request a track by putting a YouTube link in the donation
//! comment. Each new link is appended to a JSON queue file that a separate
//! player picks up; fetching metadata and audio is that player's job.

use crate::entities::Donation;
use crate::events::DonationReceiver;
use crate::utils::shutdown::wait_for_shutdown;
use crate::utils::youtube;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum MusicQueueError {
    #[error("queue file I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("queue file serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One requested track as stored in the queue file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Canonical `https://www.youtube.com/watch?v=ID` URL.
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration_sec: u64,
    /// RFC 3339 timestamp of when the request was queued.
    #[serde(default)]
    pub added_at: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub downloaded: bool,
}

impl QueueItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            duration_sec: 0,
            added_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            file_path: None,
            downloaded: false,
        }
    }
}

/// File-backed list of requested tracks.
#[derive(Debug)]
pub struct MusicQueue {
    path: PathBuf,
    items: Vec<QueueItem>,
}

impl MusicQueue {
    /// Load the queue from `path`.
    ///
    /// A missing file is an empty queue. So is an unreadable one, with a
    /// warning; the next save overwrites it.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = match Self::read_items(&path).await {
            Ok(items) => {
                info!(path = %path.display(), count = items.len(), "Loaded music queue");
                items
            }
            Err(MusicQueueError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Music queue file unreadable, starting empty");
                Vec::new()
            }
        };
        Self { path, items }
    }

    async fn read_items(path: &Path) -> Result<Vec<QueueItem>, MusicQueueError> {
        let raw = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    pub async fn save(&self) -> Result<(), MusicQueueError> {
        let json = serde_json::to_string_pretty(&self.items)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn contains(&self, url: &str) -> bool {
        self.items.iter().any(|item| item.url == url)
    }

    /// Queue the YouTube link found in `comment`, if any.
    ///
    /// Returns the queued item, or `None` when the comment has no link or
    /// the link is already queued.
    pub async fn add_from_comment(
        &mut self,
        comment: &str,
    ) -> Result<Option<&QueueItem>, MusicQueueError> {
        let Some(url) = youtube::extract_url(comment) else {
            return Ok(None);
        };
        if self.contains(&url) {
            debug!(%url, "Track already queued");
            return Ok(None);
        }

        self.items.push(QueueItem::new(url));
        if let Err(e) = self.save().await {
            // Memory and file stay in step.
            self.items.pop();
            return Err(e);
        }
        Ok(self.items.last())
    }
}

/// Feeds donation comments into a [`MusicQueue`].
pub struct MusicQueueRunner {
    queue: MusicQueue,
    donation_rx: DonationReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl MusicQueueRunner {
    pub fn new(
        queue: MusicQueue,
        donation_rx: DonationReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            queue,
            donation_rx,
            shutdown_rx,
        }
    }

    /// Run until shutdown, returning the queue.
    pub async fn run(mut self) -> MusicQueue {
        info!("MusicQueue started");

        loop {
            tokio::select! {
                biased;

                _ = wait_for_shutdown(&mut self.shutdown_rx) => {
                    info!("MusicQueue received shutdown signal");
                    break;
                }

                donation = self.donation_rx.recv() => {
                    let Some(donation) = donation else {
                        info!("Donation channel closed");
                        break;
                    };
                    self.handle_donation(&donation).await;
                }
            }
        }

        info!("MusicQueue shutdown complete");
        self.queue
    }

    async fn handle_donation(&mut self, donation: &Donation) {
        let Some(comment) = donation.comment.as_deref() else {
            return;
        };
        match self.queue.add_from_comment(comment).await {
            Ok(Some(item)) => info!(url = %item.url, donor = %donation.donor_display(), "Queued track"),
            Ok(None) => {}
            Err(e) => error!(error = %e, "Failed to queue track"),
        }
    }
}

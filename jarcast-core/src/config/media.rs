//! Media selection configuration.

use std::path::PathBuf;
use std::time::Duration;

/// An amount bucket mapped to candidate media.
///
/// Bounds are inclusive and in minor units; `max_amount == None` means
/// unbounded. Rules are evaluated in configured order and the first
/// matching one wins, so overlapping buckets resolve to the earlier rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRule {
    pub min_amount: i64,
    pub max_amount: Option<i64>,
    /// Image references relative to the media root.
    pub images: Vec<String>,
    /// Sound references relative to the media root.
    pub sounds: Vec<String>,
}

impl MediaRule {
    pub fn new(min_amount: i64, max_amount: Option<i64>) -> Self {
        Self {
            min_amount,
            max_amount,
            images: Vec::new(),
            sounds: Vec::new(),
        }
    }

    pub fn with_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images = images.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sounds<I, S>(mut self, sounds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sounds = sounds.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches(&self, amount: i64) -> bool {
        self.min_amount <= amount && self.max_amount.is_none_or(|max| amount <= max)
    }
}

/// Media directory, display timing and amount rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConfig {
    /// Directory scanned for the global image and sound pools.
    pub root: PathBuf,
    /// How long a notification stays on the overlay.
    pub display_duration: Duration,
    /// Extra gap after each queued notification before the next one.
    pub display_buffer: Duration,
    pub rules: Vec<MediaRule>,
}

impl MediaConfig {
    pub const DEFAULT_DISPLAY_DURATION: Duration = Duration::from_millis(5000);
    pub const DEFAULT_DISPLAY_BUFFER: Duration = Duration::from_millis(500);
}

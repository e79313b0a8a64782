//! Donation poller configuration.

use std::time::Duration;

/// Donation poller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Ledger account (jar id) to watch.
    pub account: String,
    /// Pause between the end of one poll cycle and the start of the next.
    pub poll_interval: Duration,
    /// How far back the baseline load and the first cycle look.
    pub lookback: time::Duration,
}

impl PollerConfig {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
    pub const DEFAULT_LOOKBACK: time::Duration = time::Duration::HOUR;

    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            lookback: Self::DEFAULT_LOOKBACK,
        }
    }
}

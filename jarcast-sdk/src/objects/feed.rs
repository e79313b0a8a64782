//! WebSocket message types for the donations feed.
//!
//! A feed client first receives [`FeedMessage::Init`] with the current
//! history (oldest first), then one [`FeedMessage::NewDonation`] per
//! accepted donation.

use serde::{Deserialize, Serialize};

/// A donation as rendered by the feed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedDonation {
    /// Donor name, `Anonymous` when the ledger did not carry one.
    pub donor_name: String,
    /// Amount in major currency units.
    pub amount: f64,
    /// Comment, empty when missing.
    pub comment: String,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
}

/// Server-to-feed WebSocket message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    Init { donations: Vec<FeedDonation> },
    NewDonation { donation: FeedDonation },
}

use crate::entities::Transaction;
use compact_str::CompactString;
use std::fmt;
use time::OffsetDateTime;

/// Currency of every Monobank jar donation.
pub const DEFAULT_CURRENCY: &str = "UAH";

/// A donation flowing through the pipeline.
///
/// Created by the poller from a [`Transaction`] or synthesized by a manual
/// trigger, then passed around by reference. `amount` is in minor units and
/// always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Donation {
    pub amount: i64,
    pub currency: CompactString,
    pub comment: Option<String>,
    pub donor_name: Option<String>,
    pub timestamp: OffsetDateTime,
}

impl Donation {
    /// A donation of `amount` minor units stamped with the current time.
    pub fn new(amount: i64) -> Self {
        Self {
            amount,
            currency: CompactString::const_new(DEFAULT_CURRENCY),
            comment: None,
            donor_name: None,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_donor_name(mut self, donor_name: impl Into<String>) -> Self {
        self.donor_name = Some(donor_name.into());
        self
    }

    /// Build the donation for a newly accepted ledger entry.
    ///
    /// The comment falls back to the statement description when the donor
    /// left no comment.
    pub fn from_transaction(tx: &Transaction) -> Self {
        let comment = tx
            .comment
            .clone()
            .or_else(|| Some(tx.description.clone()).filter(|d| !d.is_empty()));
        Self {
            amount: tx.amount,
            currency: CompactString::const_new(DEFAULT_CURRENCY),
            comment,
            donor_name: tx.donor_name.clone(),
            timestamp: tx.time,
        }
    }

    /// Amount in major units (hryvnias).
    pub fn amount_major(&self) -> f64 {
        self.amount as f64 / 100.0
    }

    /// Donor name for display.
    pub fn donor_display(&self) -> &str {
        self.donor_name.as_deref().unwrap_or("Anonymous")
    }
}

impl fmt::Display for Donation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {}",
            self.donor_display(),
            crate::utils::amount::format_minor(self.amount),
            self.currency
        )
    }
}

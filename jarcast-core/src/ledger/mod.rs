//! Ledger access.
//!
//! [`TransactionSource`] is the seam between the poller and the bank API;
//! [`MonobankClient`] is the production implementation.

pub mod monobank;

pub use monobank::MonobankClient;

use crate::entities::Transaction;
use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

/// Errors that can occur while reading the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// API request error
    #[error("API request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Rate limit exceeded
    #[error("rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// API returned a non-success status
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Endpoint could not be built from the base URL
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// A source of incoming ledger transactions.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetch the incoming transactions of `account` between `from` and `to`.
    ///
    /// Only entries with a positive amount are returned. Order is up to the
    /// implementation.
    async fn fetch_incoming(
        &self,
        account: &str,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<Transaction>, LedgerError>;
}

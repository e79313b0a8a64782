//! Ledger API configuration.

use url::Url;

/// Credentials and endpoint for the Monobank personal API.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Personal API token sent as `X-Token`.
    pub token: String,
    /// API root, `https://api.monobank.ua` in production.
    pub base_url: Url,
}

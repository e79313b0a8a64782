//! Monobank personal API client.
//!
//! Reads jar statements and the client's jar list. Monobank allows one
//! statement request per account per minute; a `429` surfaces as
//! [`LedgerError::RateLimited`] and the poller simply tries again on its
//! next tick.

use super::{LedgerError, TransactionSource};
use crate::config::LedgerConfig;
use crate::entities::Transaction;
use async_trait::async_trait;
use jarcast_sdk::objects::{ClientInfo, JarItem, StatementItem};
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tracing::{debug, warn};
use url::Url;

/// Typed HTTP client for the Monobank personal API.
#[derive(Debug, Clone)]
pub struct MonobankClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl MonobankClient {
    pub const DEFAULT_BASE_URL: &str = "https://api.monobank.ua";
    pub const TOKEN_HEADER: &str = "X-Token";

    /// Monobank asks clients to wait a minute between statement calls.
    const RATE_LIMIT_BACKOFF_SECS: u64 = 60;

    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, LedgerError> {
        let url = self.base_url.join(endpoint)?;
        let response = self
            .http
            .get(url)
            .header(Self::TOKEN_HEADER, &self.token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LedgerError::RateLimited {
                retry_after_secs: Self::RATE_LIMIT_BACKOFF_SECS,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// `GET /personal/client-info`.
    pub async fn client_info(&self) -> Result<ClientInfo, LedgerError> {
        self.get_json("/personal/client-info").await
    }

    /// All jars owned by the token holder.
    pub async fn list_jars(&self) -> Result<Vec<JarItem>, LedgerError> {
        Ok(self.client_info().await?.jars)
    }

    /// `GET /personal/statement/{account}/{from}/{to}`, raw items.
    pub async fn statements(
        &self,
        account: &str,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<StatementItem>, LedgerError> {
        let endpoint = format!(
            "/personal/statement/{}/{}/{}",
            account,
            from.unix_timestamp(),
            to.unix_timestamp()
        );
        self.get_json(&endpoint).await
    }
}

/// Turn raw statement items into incoming transactions, newest first.
///
/// Malformed items are skipped with a warning and outgoing or zero entries
/// are dropped.
pub fn incoming_transactions(items: Vec<StatementItem>) -> Vec<Transaction> {
    let mut transactions: Vec<Transaction> = items
        .into_iter()
        .filter_map(|item| match Transaction::try_from(item) {
            Ok(tx) => Some(tx),
            Err(e) => {
                warn!(error = %e, "Skipping malformed statement item");
                None
            }
        })
        .filter(Transaction::is_incoming)
        .collect();

    transactions.sort_by(|a, b| b.time.cmp(&a.time));
    transactions
}

#[async_trait]
impl TransactionSource for MonobankClient {
    async fn fetch_incoming(
        &self,
        account: &str,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let items = self.statements(account, from, to).await?;
        let fetched = items.len();
        let transactions = incoming_transactions(items);

        debug!(
            account,
            fetched,
            incoming = transactions.len(),
            "Fetched jar statement"
        );

        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    fn client_for(server: &MockServer) -> MonobankClient {
        MonobankClient::new(&LedgerConfig {
            token: "test-token".to_owned(),
            base_url: Url::parse(&server.uri()).unwrap(),
        })
    }

    fn window() -> (OffsetDateTime, OffsetDateTime) {
        (
            OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
            OffsetDateTime::from_unix_timestamp(1_700_003_600).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_fetch_incoming_filters_and_sorts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/personal/statement/jar-1/1700000000/1700003600"))
            .and(header("X-Token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "old", "time": 1700000100, "amount": 5000, "description": "Від: Ira"},
                {"id": "out", "time": 1700000200, "amount": -300, "description": "withdrawal"},
                {"time": 1700000300, "amount": 700, "description": "no id"},
                {"id": "new", "time": 1700000400, "amount": 10000, "description": "З білої картки", "comment": "слава"},
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let (from, to) = window();
        let transactions = client_for(&server)
            .fetch_incoming("jar-1", from, to)
            .await
            .unwrap();

        let ids: Vec<&str> = transactions.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(transactions[0].comment.as_deref(), Some("слава"));
        assert_eq!(transactions[1].donor_name.as_deref(), Some("Ira"));
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let (from, to) = window();
        let err = client_for(&server)
            .fetch_incoming("jar-1", from, to)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn test_api_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Unknown 'X-Token'"))
            .mount(&server)
            .await;

        let err = client_for(&server).list_jars().await.unwrap_err();
        match err {
            LedgerError::Api { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "Unknown 'X-Token'");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_list_jars() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/personal/client-info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Streamer",
                "jars": [
                    {"id": "j1", "sendId": "jar/abc", "title": "Drones", "currencyCode": 980, "balance": 120000, "goal": 5000000},
                    {"id": "j2", "title": "Coffee"}
                ]
            })))
            .mount(&server)
            .await;

        let jars = client_for(&server).list_jars().await.unwrap();
        assert_eq!(jars.len(), 2);
        assert_eq!(jars[0].send_id, "jar/abc");
        assert_eq!(jars[0].goal, Some(5_000_000));
        assert_eq!(jars[1].balance, 0);
    }
}

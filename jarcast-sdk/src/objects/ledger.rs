//! Monobank personal API response objects.
//!
//! Fields the ledger client must validate (`id`, `amount`) are optional so
//! that a malformed statement item can be skipped instead of failing the
//! whole response.

use serde::{Deserialize, Serialize};

/// One entry of `GET /personal/statement/{account}/{from}/{to}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementItem {
    #[serde(default)]
    pub id: Option<String>,
    /// Unix timestamp in seconds.
    #[serde(default)]
    pub time: Option<i64>,
    /// Signed amount in minor units.
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub currency_code: Option<u16>,
}

/// Response of `GET /personal/client-info`; only jars are read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub jars: Vec<JarItem>,
}

/// A jar ("банка") owned by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JarItem {
    pub id: String,
    #[serde(default)]
    pub send_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// ISO 4217 numeric code, 980 is UAH.
    #[serde(default = "default_currency_code")]
    pub currency_code: u16,
    /// Balance in minor units.
    #[serde(default)]
    pub balance: i64,
    /// Goal in minor units, absent when the jar has no goal.
    #[serde(default)]
    pub goal: Option<i64>,
}

fn default_currency_code() -> u16 {
    980
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_item_tolerates_missing_fields() {
        let json = r#"[
            {"id":"a1","time":1700000000,"amount":5000,"description":"Від: Олена","comment":"hi"},
            {"time":1700000001,"description":"broken"}
        ]"#;
        let items: Vec<StatementItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].amount, Some(5000));
        assert_eq!(items[1].id, None);
        assert_eq!(items[1].amount, None);
    }

    #[test]
    fn test_jar_defaults() {
        let json = r#"{"jars":[{"id":"j1","title":"Drones"}]}"#;
        let info: ClientInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.jars[0].currency_code, 980);
        assert_eq!(info.jars[0].goal, None);
    }
}

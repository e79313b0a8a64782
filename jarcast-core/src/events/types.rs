use crate::entities::Donation;
use crate::utils::amount::{AmountParseError, parse_major_amount};
use thiserror::Error;

/// A manually requested donation, shown immediately without queueing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualTrigger {
    /// Amount in minor units.
    pub amount: i64,
    pub donor_name: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerParseError {
    #[error("invalid amount: {0}")]
    Amount(#[from] AmountParseError),
}

impl Default for ManualTrigger {
    /// The stock test donation: 100.00 UAH from "Test User".
    fn default() -> Self {
        Self {
            amount: 10_000,
            donor_name: Some("Test User".to_owned()),
            comment: Some("Test donation".to_owned()),
        }
    }
}

impl ManualTrigger {
    /// Parse a console line.
    ///
    /// An empty line is the stock test donation. Otherwise the line reads
    /// `<amount> [donor] [comment...]` with the amount in major units.
    pub fn parse_command(line: &str) -> Result<Self, TriggerParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::default());
        }

        let mut parts = line.splitn(3, char::is_whitespace);
        let amount = parse_major_amount(parts.next().unwrap_or_default())?;
        let donor_name = parts
            .next()
            .filter(|d| !d.is_empty())
            .map(str::to_owned);
        let comment = parts
            .next()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned);

        Ok(Self {
            amount,
            donor_name,
            comment,
        })
    }

    pub fn into_donation(self) -> Donation {
        Donation {
            donor_name: self.donor_name,
            comment: self.comment,
            ..Donation::new(self.amount)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_line_is_stock_test_donation() {
        assert_eq!(ManualTrigger::parse_command("  "), Ok(ManualTrigger::default()));
    }

    #[test]
    fn test_parses_amount_donor_and_comment() {
        let trigger = ManualTrigger::parse_command("250.50 Oksana play something loud").unwrap();
        assert_eq!(trigger.amount, 25050);
        assert_eq!(trigger.donor_name.as_deref(), Some("Oksana"));
        assert_eq!(trigger.comment.as_deref(), Some("play something loud"));

        let bare = ManualTrigger::parse_command("50").unwrap();
        assert_eq!(bare.amount, 5000);
        assert_eq!(bare.donor_name, None);
        assert_eq!(bare.comment, None);
    }

    #[test]
    fn test_rejects_bad_amount() {
        assert!(ManualTrigger::parse_command("lots Oksana").is_err());
        assert!(ManualTrigger::parse_command("-10").is_err());
    }

    #[test]
    fn test_into_donation() {
        let donation = ManualTrigger::default().into_donation();
        assert_eq!(donation.amount, 10_000);
        assert_eq!(donation.to_string(), "Test User: 100.00 UAH");
    }
}

use compact_str::CompactString;
use jarcast_sdk::objects::StatementItem;
use thiserror::Error;
use time::OffsetDateTime;

/// Prefix Monobank puts in front of the sender's name in jar top-ups.
const DONOR_PREFIX: &str = "Від: ";

/// An incoming ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Opaque id, unique per ledger.
    pub id: CompactString,
    pub time: OffsetDateTime,
    /// Signed amount in minor units; positive means incoming.
    pub amount: i64,
    pub description: String,
    pub comment: Option<String>,
    pub donor_name: Option<String>,
}

/// Reasons a statement item cannot become a [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedTransaction {
    #[error("statement item has no id")]
    MissingId,

    #[error("statement item {id} has no amount")]
    MissingAmount { id: String },

    #[error("statement item {id} has an out of range timestamp {time}")]
    InvalidTime { id: String, time: i64 },
}

impl Transaction {
    /// Whether this entry is money coming into the jar.
    pub fn is_incoming(&self) -> bool {
        self.amount > 0
    }

    /// Extract the donor name from a statement description.
    ///
    /// `"Від: John Doe"` yields `Some("John Doe")`; anything else, such as
    /// `"З білої картки"`, yields `None`.
    pub fn parse_donor_name(description: &str) -> Option<String> {
        let name = description.strip_prefix(DONOR_PREFIX)?.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_owned())
        }
    }
}

impl TryFrom<StatementItem> for Transaction {
    type Error = MalformedTransaction;

    fn try_from(item: StatementItem) -> Result<Self, Self::Error> {
        let id = match item.id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(MalformedTransaction::MissingId),
        };
        let Some(amount) = item.amount else {
            return Err(MalformedTransaction::MissingAmount { id });
        };
        let time = match item.time {
            Some(ts) => OffsetDateTime::from_unix_timestamp(ts)
                .map_err(|_| MalformedTransaction::InvalidTime { id: id.clone(), time: ts })?,
            None => OffsetDateTime::UNIX_EPOCH,
        };
        let donor_name = Self::parse_donor_name(&item.description);

        Ok(Self {
            id: CompactString::from(id),
            time,
            amount,
            description: item.description,
            comment: item.comment.filter(|c| !c.is_empty()),
            donor_name,
        })
    }
}

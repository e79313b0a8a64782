pub mod donation;
pub mod transaction;

pub use donation::{DEFAULT_CURRENCY, Donation};
pub use transaction::{MalformedTransaction, Transaction};

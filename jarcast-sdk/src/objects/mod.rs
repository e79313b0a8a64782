pub mod feed;
pub mod ledger;
pub mod overlay;

pub use feed::{FeedDonation, FeedMessage};
pub use ledger::{ClientInfo, JarItem, StatementItem};
pub use overlay::{MEDIA_URL_PREFIX, OverlayMessage};

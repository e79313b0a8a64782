//! Donation feed configuration.

/// Donation feed configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    /// How many donations the feed keeps; older ones are evicted.
    pub capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

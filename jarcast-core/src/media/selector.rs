//! Amount-based media selection.
//!
//! Rules are scanned in configured order and the first bucket containing
//! the amount wins, even if a later bucket also contains it. Inside the
//! winning rule one image and one sound are picked uniformly at random,
//! with the global pools standing in for empty rule lists. Without a
//! matching rule (or without an amount) both come from the global pools.
//! The only way to get nothing is an empty global image pool.

use super::library::MediaLibrary;
use crate::config::MediaRule;
use rand::Rng;
use rand::seq::IndexedRandom;

/// A concrete (image, sound) pair to put on the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSelection {
    pub image: String,
    pub sound: Option<String>,
}

/// Maps donation amounts to media. Read-only after construction.
#[derive(Debug, Clone)]
pub struct MediaSelector {
    rules: Vec<MediaRule>,
    library: MediaLibrary,
}

impl MediaSelector {
    pub fn new(rules: Vec<MediaRule>, library: MediaLibrary) -> Self {
        Self { rules, library }
    }

    /// The first rule whose bucket contains `amount`.
    pub fn matching_rule(&self, amount: i64) -> Option<&MediaRule> {
        self.rules.iter().find(|rule| rule.matches(amount))
    }

    /// Select media for `amount` using the thread-local RNG.
    pub fn select(&self, amount: Option<i64>) -> Option<MediaSelection> {
        self.select_with(amount, &mut rand::rng())
    }

    /// Select media for `amount` drawing from `rng`.
    pub fn select_with<R: Rng + ?Sized>(
        &self,
        amount: Option<i64>,
        rng: &mut R,
    ) -> Option<MediaSelection> {
        if let Some(rule) = amount.and_then(|a| self.matching_rule(a)) {
            let image = pick(&rule.images, rng).or_else(|| pick(&self.library.images, rng));
            if let Some(image) = image {
                let sound = pick(&rule.sounds, rng).or_else(|| pick(&self.library.sounds, rng));
                return Some(MediaSelection { image, sound });
            }
        }

        let image = pick(&self.library.images, rng)?;
        Some(MediaSelection {
            image,
            sound: pick(&self.library.sounds, rng),
        })
    }
}

fn pick<R: Rng + ?Sized>(pool: &[String], rng: &mut R) -> Option<String> {
    pool.choose(rng).cloned()
}

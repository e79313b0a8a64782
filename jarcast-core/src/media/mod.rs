//! Media pools and amount-based selection.

pub mod library;
pub mod selector;

pub use library::MediaLibrary;
pub use selector::{MediaSelection, MediaSelector};

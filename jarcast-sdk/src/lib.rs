//! Wire objects for jarcast.
//!
//! Everything here is plain serde data: the JSON frames pushed to overlay
//! and feed browser clients, and the subset of the Monobank personal API
//! that the ledger client reads.

pub mod objects;

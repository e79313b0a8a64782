#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]
#![forbid(unsafe_code)]

pub mod config;
pub mod entities;
pub mod events;
pub mod hooks;
pub mod ledger;
pub mod media;
pub mod overlay;
pub mod processors;
pub mod utils;

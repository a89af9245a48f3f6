//! Domain types shared by every climon crate.

pub mod messages;
pub mod types;

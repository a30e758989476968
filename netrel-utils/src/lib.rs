//! Utility library for the netrel project

pub mod serde;
pub mod stats;

//! Utility module for serde of types.

pub mod ordered_map;

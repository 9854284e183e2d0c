//! CLI command implementations.

pub mod indexes;
pub mod seed;

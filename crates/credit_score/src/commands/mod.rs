//! CLI command implementations.

pub mod score;
pub mod train;

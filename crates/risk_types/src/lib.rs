//! Common structs for client records and risk reports shared across crates.

mod record;
mod report;

pub use record::*;
pub use report::*;

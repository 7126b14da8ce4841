//! Policy and pipeline configuration loaded from the environment.

mod config;

pub use config::*;

//! Credit Risk Scoring Demonstrator
//!
//! An offline-trained credit default classifier with a CLI front end for
//! per-client risk reports.

pub mod commands;

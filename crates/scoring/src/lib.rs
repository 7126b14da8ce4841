//! Scoring service over a loaded artifact bundle.
//!
//! A [`ServiceHandle`] owns one immutable bundle plus a client snapshot
//! index, and answers per-client queries. It replaces the load-once
//! process-global pattern with an explicitly
//! constructed, explicitly owned value: callers decide when to build one
//! and when to [`ServiceHandle::reload`] it.

mod rationale;
mod service;

pub use service::{ScoreError, ServiceHandle};

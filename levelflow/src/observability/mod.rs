//! Observability utilities.
//!
//! The engine itself only emits `tracing` events and spans. This module
//! offers a one-call subscriber setup for binaries and tests, plus a small
//! timer used to report durations.

mod subscriber;
mod timer;

pub use subscriber::{init_tracing, try_init_tracing, LogFormat};
pub use timer::SpanTimer;

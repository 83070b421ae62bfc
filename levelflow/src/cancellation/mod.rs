//! Cooperative cancellation.
//!
//! The engine threads a [`CancellationToken`] (through a
//! [`RunContext`](crate::context::RunContext)) into every executor call but
//! never acts on it: stopping early is the executor's decision.

mod token;

pub use token::{CancelCallback, CancellationToken};

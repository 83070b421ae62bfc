//! Testing utilities for levelflow pipelines.
//!
//! This module provides:
//! - Mock executors that record what ran, when, and how concurrently
//! - Assertions over levels and execution logs

mod assertions;
mod mocks;

pub use assertions::{assert_dependencies_precede, assert_finished_before, assert_not_run};
pub use mocks::{ExecutionEvent, ExecutionLog, MockExecutor};

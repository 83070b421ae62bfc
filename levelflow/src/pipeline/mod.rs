//! Pipeline building and execution.
//!
//! This module provides:
//! - The [`Pipeline`] registry and its cached level sequence
//! - [`PipelineBuilder`] for one-shot construction
//! - The sequential and parallel execution strategies

mod builder;
mod parallel;
mod runner;
mod sequential;

pub use builder::PipelineBuilder;
pub use runner::Pipeline;

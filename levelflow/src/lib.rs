//! # Levelflow
//!
//! Dependency-leveled task orchestration.
//!
//! Levelflow runs a set of named executors against one shared payload:
//!
//! - **Executors**: async units of work, registered by name or as closures
//! - **Dependency graph**: an optional "task depends on tasks" map
//! - **Levels**: groups of tasks whose dependencies all finished earlier
//! - **Strategies**: run tasks one at a time, or each level concurrently
//! - **Error policy**: decide per failure whether to continue, abort or halt
//!
//! ## Quick Start
//!
//! ```rust
//! use levelflow::prelude::*;
//! use std::collections::HashMap;
//!
//! type Kitchen = SharedPayload<HashMap<String, i64>>;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let mut pipeline: Pipeline<Kitchen> = Pipeline::new("breakfast");
//! pipeline.set_dependency_graph(DependencyGraph::new().depends_on("scramble", ["eggs", "milk"]));
//! pipeline.set_strategy(Strategy::Parallel);
//!
//! pipeline
//!     .add_fn("eggs", |_ctx: &RunContext, k: &Kitchen| {
//!         k.lock().insert("eggs".into(), 1);
//!         Ok(())
//!     })
//!     .add_fn("milk", |_ctx: &RunContext, k: &Kitchen| {
//!         k.lock().insert("milk".into(), 1);
//!         Ok(())
//!     })
//!     .add_fn("scramble", |_ctx: &RunContext, k: &Kitchen| {
//!         let mut k = k.lock();
//!         let total = k["eggs"] + k["milk"];
//!         k.insert("scramble".into(), total);
//!         Ok(())
//!     });
//!
//! let kitchen = Kitchen::default();
//! pipeline.execute(&RunContext::new(), &kitchen).await?;
//! assert_eq!(kitchen.snapshot()["scramble"], 2);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod context;
pub mod errors;
pub mod executor;
pub mod graph;
pub mod levels;
pub mod observability;
pub mod payload;
pub mod pipeline;
pub mod policy;
pub mod strategy;
pub mod testing;

pub use config::PipelineConfig;
pub use context::RunContext;
pub use errors::GraphValidationError;
pub use executor::{AsyncFnExecutor, Executor, ExecutorRef, FnExecutor};
pub use graph::DependencyGraph;
pub use levels::Levels;
pub use payload::SharedPayload;
pub use pipeline::{Pipeline, PipelineBuilder};
pub use policy::{ErrorAction, ErrorPolicy, FailureMode};
pub use strategy::Strategy;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::PipelineConfig;
    pub use crate::context::RunContext;
    pub use crate::errors::GraphValidationError;
    pub use crate::executor::{AsyncFnExecutor, Executor, ExecutorRef, FnExecutor};
    pub use crate::graph::DependencyGraph;
    pub use crate::levels::Levels;
    pub use crate::observability::init_tracing;
    pub use crate::payload::SharedPayload;
    pub use crate::pipeline::{Pipeline, PipelineBuilder};
    pub use crate::policy::{ErrorAction, ErrorPolicy, FailureMode};
    pub use crate::strategy::Strategy;
}

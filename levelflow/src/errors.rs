//! Error types for the levelflow engine.
//!
//! The engine itself never produces an error while executing: whatever an
//! executor (or the error policy) returns is forwarded verbatim. The only
//! errors owned by this crate come from the opt-in validation pass over a
//! dependency graph.

use thiserror::Error;

/// A type-erased error, handy as an executor error type when `anyhow` is not wanted.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error raised by the explicit graph validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphValidationError {
    /// The graph contains a dependency cycle.
    #[error("Cycle detected in dependency graph: {}", path.join(" -> "))]
    Cycle {
        /// The tasks forming the cycle; the first task is repeated at the end.
        path: Vec<String>,
    },

    /// A task lists itself as a dependency.
    #[error("Task '{task}' cannot depend on itself")]
    SelfDependency {
        /// The offending task.
        task: String,
    },

    /// The graph mentions a task that has no registered executor.
    #[error("Task '{task}' appears in the dependency graph but has no registered executor")]
    UnregisteredTask {
        /// The task name from the graph.
        task: String,
    },

    /// A registered executor is absent from the graph and would never run.
    #[error("Executor '{task}' is registered but absent from the dependency graph; it would never run")]
    Unscheduled {
        /// The registered task name.
        task: String,
    },
}

impl GraphValidationError {
    /// Returns a short stable label for use in logs.
    #[must_use]
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::Cycle { .. } => "graph_cycle",
            Self::SelfDependency { .. } => "graph_self_dependency",
            Self::UnregisteredTask { .. } => "graph_unregistered_task",
            Self::Unscheduled { .. } => "graph_unscheduled_executor",
        }
    }

    /// Returns the tasks involved in the error.
    #[must_use]
    pub fn tasks(&self) -> Vec<String> {
        match self {
            Self::Cycle { path } => path.clone(),
            Self::SelfDependency { task }
            | Self::UnregisteredTask { task }
            | Self::Unscheduled { task } => vec![task.clone()],
        }
    }
}

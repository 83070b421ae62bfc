//! Execution context passed to executors.

mod run;

pub use run::RunContext;

//! Pipeline builder.

use super::Pipeline;
use crate::config::PipelineConfig;
use crate::context::RunContext;
use crate::executor::{Executor, ExecutorRef};
use crate::graph::DependencyGraph;
use crate::policy::{ErrorAction, ErrorPolicy, FailureMode};
use crate::strategy::Strategy;
use std::fmt;
use std::sync::Arc;

/// Builder for [`Pipeline`]s.
///
/// ```rust
/// use levelflow::prelude::*;
///
/// type Prices = SharedPayload<std::collections::HashMap<String, f64>>;
/// type PriceBuilder = PipelineBuilder<Prices>;
///
/// let pipeline = PriceBuilder::new("prices")
///     .dependency_graph(DependencyGraph::new().depends_on("scramble", ["eggs"]))
///     .strategy(Strategy::Parallel)
///     .on_error(|_ctx, _payload, _err| ErrorAction::Continue)
///     .build();
///
/// assert_eq!(pipeline.strategy(), Strategy::Parallel);
/// ```
pub struct PipelineBuilder<P, E = anyhow::Error>
where
    P: Send + Sync + 'static,
    E: Send + 'static,
{
    id: String,
    graph: Option<DependencyGraph>,
    strategy: Strategy,
    on_error: Option<ErrorPolicy<P, E>>,
    executors: Vec<(String, ExecutorRef<P, E>)>,
}

impl<P, E> PipelineBuilder<P, E>
where
    P: Clone + Send + Sync + 'static,
    E: fmt::Debug + Send + 'static,
{
    /// Creates a builder with the defaults of [`Pipeline::new`].
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            graph: None,
            strategy: Strategy::default(),
            on_error: None,
            executors: Vec::new(),
        }
    }

    /// Creates a builder from a declarative config.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut builder = Self::new(config.id.clone()).strategy(config.strategy);
        if let Some(graph) = &config.dependencies {
            builder = builder.dependency_graph(graph.clone());
        }
        if let Some(mode) = config.failure_mode {
            builder = builder.failure_mode(mode);
        }
        builder
    }

    /// Sets the dependency graph.
    #[must_use]
    pub fn dependency_graph(mut self, graph: impl Into<DependencyGraph>) -> Self {
        self.graph = Some(graph.into());
        self
    }

    /// Sets the execution strategy.
    #[must_use]
    pub const fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Installs an error policy from a closure.
    #[must_use]
    pub fn on_error<F>(mut self, policy: F) -> Self
    where
        F: Fn(&RunContext, &P, E) -> ErrorAction<E> + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(policy));
        self
    }

    /// Installs a shared error policy.
    #[must_use]
    pub fn error_policy(mut self, policy: ErrorPolicy<P, E>) -> Self {
        self.on_error = Some(policy);
        self
    }

    /// Installs a preset error policy.
    #[must_use]
    pub fn failure_mode(self, mode: FailureMode) -> Self {
        self.error_policy(mode.policy())
    }

    /// Registers an executor.
    #[must_use]
    pub fn executor(mut self, name: impl Into<String>, executor: impl Executor<P, E> + 'static) -> Self {
        self.executors.push((name.into(), Arc::new(executor)));
        self
    }

    /// Builds the pipeline, computing its levels once.
    #[must_use]
    pub fn build(self) -> Pipeline<P, E> {
        let mut pipeline = Pipeline::new(self.id);
        pipeline.strategy = self.strategy;
        pipeline.on_error = self.on_error;
        pipeline.set_graph_unrefreshed(self.graph);
        for (name, executor) in self.executors {
            pipeline.insert_executor(name, executor);
        }
        pipeline.refresh_levels();
        pipeline
    }
}

impl<P, E> fmt::Debug for PipelineBuilder<P, E>
where
    P: Send + Sync + 'static,
    E: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("id", &self.id)
            .field("graph", &self.graph)
            .field("strategy", &self.strategy)
            .field("executors", &self.executors.iter().map(|(name, _)| name).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

//! The pipeline: executor registry, level cache and execution entry point.

use super::PipelineBuilder;
use crate::context::RunContext;
use crate::errors::GraphValidationError;
use crate::executor::{AsyncFnExecutor, Executor, ExecutorRef, FnExecutor};
use crate::graph::DependencyGraph;
use crate::levels::Levels;
use crate::observability::SpanTimer;
use crate::policy::{ErrorAction, ErrorPolicy};
use crate::strategy::Strategy;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};

/// A set of named executors run level by level.
///
/// Without a dependency graph every executor sits in one level, in
/// registration order. With a graph the levels come from
/// [`Levels::build`], and executors the graph never mentions are left out
/// of every level (see [`Pipeline::validate`]).
///
/// The error type `E` is opaque to the engine. It is only required to be
/// `Debug`, so failures can be logged before they reach the error policy.
pub struct Pipeline<P, E = anyhow::Error>
where
    P: Send + Sync + 'static,
    E: Send + 'static,
{
    id: String,
    executors: HashMap<String, ExecutorRef<P, E>>,
    /// Registration order, each name once.
    order: Vec<String>,
    graph: Option<DependencyGraph>,
    levels: Levels,
    pub(super) strategy: Strategy,
    pub(super) on_error: Option<ErrorPolicy<P, E>>,
}

impl<P, E> Pipeline<P, E>
where
    P: Clone + Send + Sync + 'static,
    E: fmt::Debug + Send + 'static,
{
    /// Creates an empty sequential pipeline with no graph and no error policy.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            executors: HashMap::new(),
            order: Vec::new(),
            graph: None,
            levels: Levels::flat(Vec::<String>::new()),
            strategy: Strategy::default(),
            on_error: None,
        }
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder(id: impl Into<String>) -> PipelineBuilder<P, E> {
        PipelineBuilder::new(id)
    }

    /// Returns the pipeline ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the execution strategy.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Returns the dependency graph, if one is configured.
    #[must_use]
    pub const fn dependency_graph(&self) -> Option<&DependencyGraph> {
        self.graph.as_ref()
    }

    /// Returns the cached level sequence.
    #[must_use]
    pub const fn levels(&self) -> &Levels {
        &self.levels
    }

    /// Returns the registered names in registration order.
    #[must_use]
    pub fn executor_names(&self) -> &[String] {
        &self.order
    }

    /// Returns the number of registered executors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns true if an executor is registered under the name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.executors.contains_key(name)
    }

    /// Returns true if an error policy is installed.
    #[must_use]
    pub const fn has_error_policy(&self) -> bool {
        self.on_error.is_some()
    }

    /// Registers an executor under a name.
    ///
    /// Registering a name twice replaces the executor but keeps the name's
    /// original position. Levels are recomputed when a graph is configured.
    pub fn add_executor(
        &mut self,
        name: impl Into<String>,
        executor: impl Executor<P, E> + 'static,
    ) -> &mut Self {
        self.add_executor_ref(name, Arc::new(executor))
    }

    /// Registers an already shared executor.
    pub fn add_executor_ref(&mut self, name: impl Into<String>, executor: ExecutorRef<P, E>) -> &mut Self {
        let name = name.into();
        self.insert_executor(name.clone(), executor);
        match &self.graph {
            Some(graph) => self.levels = Levels::build(graph),
            None => self.levels.push_flat(&name),
        }
        self
    }

    /// Registers a synchronous closure.
    pub fn add_fn<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&RunContext, &P) -> Result<(), E> + Send + Sync + 'static,
    {
        self.add_executor(name, FnExecutor::new::<P, E>(func))
    }

    /// Registers an async closure receiving owned clones of context and payload.
    pub fn add_async_fn<F, Fut>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(RunContext, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        self.add_executor(name, AsyncFnExecutor::new::<P, E>(func))
    }

    /// Builder-style variant of [`Pipeline::add_executor`].
    #[must_use]
    pub fn with_executor(mut self, name: impl Into<String>, executor: impl Executor<P, E> + 'static) -> Self {
        self.add_executor(name, executor);
        self
    }

    /// Installs or replaces the dependency graph and recomputes levels.
    pub fn set_dependency_graph(&mut self, graph: DependencyGraph) {
        self.graph = Some(graph);
        self.refresh_levels();
    }

    /// Removes the dependency graph; all executors run in registration order.
    pub fn clear_dependency_graph(&mut self) {
        self.graph = None;
        self.refresh_levels();
    }

    /// Sets the execution strategy.
    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
    }

    /// Installs or replaces the error policy.
    pub fn set_error_policy(&mut self, policy: ErrorPolicy<P, E>) {
        self.on_error = Some(policy);
    }

    /// Checks that the configured graph can run every registered executor.
    ///
    /// Without a graph there is nothing to check.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a self-dependency or cycle, a graph
    /// task with no executor, or a registered executor the graph never
    /// mentions (it would silently never run).
    pub fn validate(&self) -> Result<(), GraphValidationError> {
        let result = self.check_graph();
        if let Err(err) = &result {
            warn!(pipeline = %self.id, kind = err.as_label(), tasks = ?err.tasks(), "{err}");
        }
        result
    }

    fn check_graph(&self) -> Result<(), GraphValidationError> {
        let Some(graph) = &self.graph else {
            return Ok(());
        };

        graph.validate()?;

        if let Some(task) = graph.nodes().into_iter().find(|task| !self.executors.contains_key(*task)) {
            return Err(GraphValidationError::UnregisteredTask { task: task.to_string() });
        }

        if let Some(task) = self.order.iter().find(|name| !graph.contains(name)) {
            return Err(GraphValidationError::Unscheduled { task: task.clone() });
        }

        Ok(())
    }

    /// Runs every level to completion, or until the first unrecovered stop.
    ///
    /// Returns `Ok(())` when every level ran to its end, or when the error
    /// policy halted the run cleanly. Otherwise returns the executor's error,
    /// or whatever the policy remapped it to. Nothing is rolled back on
    /// failure: the payload keeps every change made by tasks that already ran.
    ///
    /// The pipeline is only borrowed, so calling `execute` again with a fresh
    /// payload starts from scratch.
    ///
    /// # Panics
    ///
    /// A panicking executor panics the caller, in both strategies. In the
    /// parallel strategy the panic resumes once the level's barrier is reached.
    pub async fn execute(&self, ctx: &RunContext, payload: &P) -> Result<(), E> {
        let span = info_span!(
            "pipeline.execute",
            pipeline = %self.id,
            run_id = %ctx.run_id(),
            strategy = %self.strategy,
            levels = self.levels.len(),
        );

        async {
            let timer = SpanTimer::start();
            let result = match self.strategy {
                Strategy::Sequential => self.run_sequential(ctx, payload).await,
                Strategy::Parallel => self.run_parallel(ctx, payload).await,
            };
            let duration_ms = timer.finish();
            match &result {
                Ok(()) => debug!(duration_ms, "pipeline finished"),
                Err(err) => debug!(duration_ms, error = ?err, "pipeline aborted"),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Looks up the executor for a scheduled task.
    pub(super) fn executor(&self, name: &str) -> Option<&ExecutorRef<P, E>> {
        let executor = self.executors.get(name);
        if executor.is_none() {
            debug!(task = %name, "no executor registered for scheduled task; skipping");
        }
        executor
    }

    /// Offers a failure to the error policy.
    ///
    /// `Break` carries the value `execute` must return.
    pub(super) fn on_failure(&self, ctx: &RunContext, payload: &P, task: &str, err: E) -> ControlFlow<Result<(), E>> {
        debug!(task = %task, error = ?err, "executor failed");

        let action = match &self.on_error {
            Some(policy) => policy(ctx, payload, err),
            None => ErrorAction::Abort(err),
        };

        match action {
            ErrorAction::Continue => ControlFlow::Continue(()),
            ErrorAction::Abort(err) => ControlFlow::Break(Err(err)),
            ErrorAction::Halt => ControlFlow::Break(Ok(())),
        }
    }

    pub(super) fn insert_executor(&mut self, name: String, executor: ExecutorRef<P, E>) {
        if self.executors.insert(name.clone(), executor).is_none() {
            self.order.push(name);
        }
    }

    pub(super) fn set_graph_unrefreshed(&mut self, graph: Option<DependencyGraph>) {
        self.graph = graph;
    }

    pub(super) fn refresh_levels(&mut self) {
        self.levels = match &self.graph {
            Some(graph) => Levels::build(graph),
            None => Levels::flat(self.order.iter().cloned()),
        };
    }
}

impl<P, E> fmt::Debug for Pipeline<P, E>
where
    P: Send + Sync + 'static,
    E: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("id", &self.id)
            .field("executors", &self.order)
            .field("graph", &self.graph)
            .field("levels", &self.levels)
            .field("strategy", &self.strategy)
            .field("has_error_policy", &self.on_error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::SharedPayload;
    use pretty_assertions::assert_eq;

    type Log = SharedPayload<Vec<String>>;
    type LogPipeline = Pipeline<Log>;

    fn record(name: &'static str) -> impl Fn(&RunContext, &Log) -> anyhow::Result<()> + Send + Sync + 'static {
        move |_ctx: &RunContext, log: &Log| {
            log.lock().push(name.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_new_pipeline_has_single_empty_level() {
        let pipeline = LogPipeline::new("empty");
        assert_eq!(pipeline.id(), "empty");
        assert_eq!(pipeline.levels().len(), 1);
        assert_eq!(pipeline.levels().task_count(), 0);
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.strategy(), Strategy::Sequential);
    }

    #[test]
    fn test_flat_level_follows_registration_order() {
        let mut pipeline = LogPipeline::new("flat");
        pipeline
            .add_fn("milk", record("milk"))
            .add_fn("eggs", record("eggs"))
            .add_fn("scramble", record("scramble"));

        assert_eq!(pipeline.levels(), &Levels::flat(["milk", "eggs", "scramble"]));
        assert_eq!(pipeline.executor_names(), ["milk", "eggs", "scramble"]);
    }

    #[tokio::test]
    async fn test_reregistration_replaces_executor_once() {
        let mut pipeline = LogPipeline::new("dupe");
        pipeline
            .add_fn("a", record("first"))
            .add_fn("b", record("b"))
            .add_fn("a", record("second"));

        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.levels(), &Levels::flat(["a", "b"]));

        let log = Log::default();
        pipeline.execute(&RunContext::new(), &log).await.unwrap();
        assert_eq!(log.snapshot(), vec!["second", "b"]);
    }

    #[test]
    fn test_levels_recomputed_on_registration_and_graph_change() {
        let mut pipeline = LogPipeline::new("graph");
        pipeline.add_fn("scramble", record("scramble"));
        pipeline.set_dependency_graph(DependencyGraph::new().depends_on("scramble", ["eggs"]));
        pipeline.add_fn("eggs", record("eggs"));

        assert_eq!(pipeline.levels().level_of("eggs"), Some(0));
        assert_eq!(pipeline.levels().level_of("scramble"), Some(1));

        pipeline.clear_dependency_graph();
        assert_eq!(pipeline.levels(), &Levels::flat(["scramble", "eggs"]));
    }

    #[test]
    fn test_validate_without_graph_is_ok() {
        let mut pipeline = LogPipeline::new("plain");
        pipeline.add_fn("a", record("a"));
        assert!(pipeline.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_unscheduled_executor() {
        let mut pipeline = LogPipeline::new("orphan");
        pipeline.set_dependency_graph(DependencyGraph::new().depends_on("b", ["a"]));
        pipeline
            .add_fn("a", record("a"))
            .add_fn("b", record("b"))
            .add_fn("orphan", record("orphan"));

        assert!(!pipeline.levels().contains("orphan"));
        assert_eq!(
            pipeline.validate(),
            Err(GraphValidationError::Unscheduled { task: "orphan".to_string() })
        );
    }

    #[test]
    fn test_validate_reports_unregistered_task() {
        let mut pipeline = LogPipeline::new("missing");
        pipeline.set_dependency_graph(DependencyGraph::new().depends_on("b", ["a"]));
        pipeline.add_fn("b", record("b"));

        assert_eq!(
            pipeline.validate(),
            Err(GraphValidationError::UnregisteredTask { task: "a".to_string() })
        );
    }

    #[test]
    fn test_validate_reports_cycle_first() {
        let mut pipeline = LogPipeline::new("cycle");
        pipeline.set_dependency_graph(
            DependencyGraph::new().depends_on("a", ["b"]).depends_on("b", ["a"]),
        );
        pipeline.add_fn("a", record("a")).add_fn("b", record("b"));

        assert!(matches!(pipeline.validate(), Err(GraphValidationError::Cycle { .. })));
        assert_eq!(pipeline.levels().task_count(), 0);
    }

    #[test]
    fn test_debug_lists_executors() {
        let pipeline = LogPipeline::new("dbg").with_executor("a", FnExecutor::new(record("a")));
        let rendered = format!("{pipeline:?}");
        assert!(rendered.contains("\"a\""));
        assert!(rendered.contains("has_error_policy: false"));
    }
}

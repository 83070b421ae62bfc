//! Serializable pipeline configuration.

use crate::context::RunContext;
use crate::graph::DependencyGraph;
use crate::policy::FailureMode;
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Declarative pipeline settings, typically loaded from JSON.
///
/// ```json
/// {
///   "id": "prices",
///   "strategy": "parallel",
///   "failure_mode": "best_effort",
///   "timeout_seconds": 5.0,
///   "dependencies": { "db": [], "eggs": ["db"], "milk": ["db"] }
/// }
/// ```
///
/// Executors cannot be described here; they are registered in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Pipeline identifier, used in logs.
    #[serde(default = "default_id")]
    pub id: String,
    /// Execution strategy.
    #[serde(default)]
    pub strategy: Strategy,
    /// Optional dependency graph. Without one, tasks run in registration order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<DependencyGraph>,
    /// Optional failure preset. Without one, the first failure aborts the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_mode: Option<FailureMode>,
    /// Optional run deadline in seconds, applied by [`PipelineConfig::run_context`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<f64>,
}

fn default_id() -> String {
    "pipeline".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            id: default_id(),
            strategy: Strategy::default(),
            dependencies: None,
            failure_mode: None,
            timeout_seconds: None,
        }
    }
}

impl PipelineConfig {
    /// Creates a config with defaults and the given ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Parses a config from JSON.
    ///
    /// # Errors
    ///
    /// Returns the parse error for malformed JSON, unknown fields, or
    /// unknown strategy / failure mode names.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the config to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Sets the strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the dependency graph.
    #[must_use]
    pub fn with_dependencies(mut self, graph: DependencyGraph) -> Self {
        self.dependencies = Some(graph);
        self
    }

    /// Sets the failure preset.
    #[must_use]
    pub const fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = Some(mode);
        self
    }

    /// Sets the run timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_seconds = Some(timeout.as_secs_f64());
        self
    }

    /// Returns the run timeout, ignoring negative or non-finite values.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Creates a fresh run context honoring the configured timeout.
    #[must_use]
    pub fn run_context(&self) -> RunContext {
        let ctx = RunContext::new();
        match self.timeout() {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.id, "pipeline");
        assert_eq!(config.strategy, Strategy::Sequential);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_full_config() {
        let config = PipelineConfig::from_json_str(
            r#"{
                "id": "prices",
                "strategy": "parallel",
                "failure_mode": "best_effort",
                "timeout_seconds": 2.5,
                "dependencies": {"db": [], "eggs": ["db"], "milk": ["db"]}
            }"#,
        )
        .unwrap();

        assert_eq!(config.id, "prices");
        assert_eq!(config.strategy, Strategy::Parallel);
        assert_eq!(config.failure_mode, Some(FailureMode::BestEffort));
        assert_eq!(config.timeout(), Some(Duration::from_millis(2500)));
        let graph = config.dependencies.as_ref().unwrap();
        assert_eq!(graph.dependencies("milk"), ["db".to_string()]);
    }

    #[test]
    fn test_rejects_unknown_strategy_and_fields() {
        assert!(PipelineConfig::from_json_str(r#"{"strategy": "eager"}"#).is_err());
        assert!(PipelineConfig::from_json_str(r#"{"retries": 3}"#).is_err());
    }

    #[test]
    fn test_negative_timeout_ignored() {
        let config = PipelineConfig {
            timeout_seconds: Some(-1.0),
            ..PipelineConfig::default()
        };
        assert!(config.timeout().is_none());
        assert!(config.run_context().deadline().is_none());
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = PipelineConfig::new("prices")
            .with_strategy(Strategy::Parallel)
            .with_dependencies(DependencyGraph::new().depends_on("b", ["a"]))
            .with_failure_mode(FailureMode::FailFast);

        let json = config.to_json_string().unwrap();
        assert_eq!(PipelineConfig::from_json_str(&json).unwrap(), config);
    }
}

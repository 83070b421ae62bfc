//! Error policy: decides, per failure, whether a run aborts or continues.

use crate::context::RunContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// What the pipeline should do after an executor failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorAction<E> {
    /// Ignore the failure and keep going.
    Continue,
    /// Stop the run and return this error. It may differ from the original.
    Abort(E),
    /// Stop the run cleanly: `execute` returns `Ok(())`.
    Halt,
}

impl<E> ErrorAction<E> {
    /// Builds an action from an `(error, continue)` pair.
    ///
    /// `continue == true` wins regardless of the error. Otherwise a present
    /// error aborts with it and an absent one halts cleanly.
    pub fn from_parts(error: Option<E>, proceed: bool) -> Self {
        match (error, proceed) {
            (_, true) => Self::Continue,
            (Some(err), false) => Self::Abort(err),
            (None, false) => Self::Halt,
        }
    }

    /// Splits the action back into an `(error, continue)` pair.
    pub fn into_parts(self) -> (Option<E>, bool) {
        match self {
            Self::Continue => (None, true),
            Self::Abort(err) => (Some(err), false),
            Self::Halt => (None, false),
        }
    }

    /// Returns true if the run should stop.
    pub const fn is_stop(&self) -> bool {
        !matches!(self, Self::Continue)
    }
}

/// Callback consulted once per failing executor.
///
/// Receives the run context, the payload as it was left by the failing
/// executor, and the error.
pub type ErrorPolicy<P, E = anyhow::Error> =
    Arc<dyn Fn(&RunContext, &P, E) -> ErrorAction<E> + Send + Sync>;

/// Ready-made failure handling presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Stop at the first failure and return its error (default).
    #[default]
    FailFast,
    /// Record nothing, stop nothing: every failure is ignored.
    BestEffort,
}

impl FailureMode {
    /// Builds the matching error policy.
    #[must_use]
    pub fn policy<P, E>(self) -> ErrorPolicy<P, E>
    where
        P: 'static,
        E: 'static,
    {
        match self {
            Self::FailFast => Arc::new(|_: &RunContext, _: &P, err: E| ErrorAction::Abort(err)),
            Self::BestEffort => Arc::new(|_: &RunContext, _: &P, _: E| ErrorAction::Continue),
        }
    }

    /// Returns the mode's config name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FailFast => "fail_fast",
            Self::BestEffort => "best_effort",
        }
    }
}

impl fmt::Display for FailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_fast" => Ok(Self::FailFast),
            "best_effort" => Ok(Self::BestEffort),
            other => Err(format!("unknown failure mode '{other}'")),
        }
    }
}

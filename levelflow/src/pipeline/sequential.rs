//! Sequential strategy: one task at a time, in stored order.

use super::Pipeline;
use crate::context::RunContext;
use std::fmt;
use std::ops::ControlFlow;
use tracing::{debug, trace};

impl<P, E> Pipeline<P, E>
where
    P: Clone + Send + Sync + 'static,
    E: fmt::Debug + Send + 'static,
{
    /// Runs levels in order and each level's tasks in stored order.
    ///
    /// A stopping failure skips the rest of the current level and every
    /// later level.
    pub(super) async fn run_sequential(&self, ctx: &RunContext, payload: &P) -> Result<(), E> {
        for (index, level) in self.levels().iter().enumerate() {
            debug!(level = index, tasks = level.len(), "starting level");

            for name in level {
                let Some(executor) = self.executor(name) else {
                    continue;
                };

                trace!(task = %name, "executor started");
                match executor.execute(ctx, payload).await {
                    Ok(()) => trace!(task = %name, "executor finished"),
                    Err(err) => {
                        if let ControlFlow::Break(result) = self.on_failure(ctx, payload, name, err) {
                            return result;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

//! Parallel strategy: every task of a level at once, barrier between levels.

use super::Pipeline;
use crate::context::RunContext;
use futures::future::join_all;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, trace, warn};

/// Aborts a level's tasks when dropped.
///
/// Once the barrier is reached every task has finished and aborting is a
/// no-op. If the `execute` future is dropped first, the tasks stop at their
/// next await point instead of outliving the run.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

impl<P, E> Pipeline<P, E>
where
    P: Clone + Send + Sync + 'static,
    E: fmt::Debug + Send + 'static,
{
    /// Runs each level's tasks concurrently and waits for all of them.
    ///
    /// Only after the barrier are the level's failures handed to the error
    /// policy, one at a time, in the order they were reported. A stop from
    /// the policy prevents the next level from starting; failures the policy
    /// lets through do not.
    ///
    /// Dropping the returned future aborts the tasks of the running level.
    pub(super) async fn run_parallel(&self, ctx: &RunContext, payload: &P) -> Result<(), E> {
        for (index, level) in self.levels().iter().enumerate() {
            debug!(level = index, tasks = level.len(), "starting level");

            // One slot per task: a failing task never waits to report.
            let (tx, mut rx) = mpsc::channel::<(String, E)>(level.len().max(1));
            let mut handles = Vec::with_capacity(level.len());

            for name in level {
                let Some(executor) = self.executor(name) else {
                    continue;
                };

                let executor = Arc::clone(executor);
                let ctx = ctx.clone();
                let payload = payload.clone();
                let tx = tx.clone();
                let name = name.clone();

                handles.push(tokio::spawn(async move {
                    trace!(task = %name, "executor started");
                    match executor.execute(&ctx, &payload).await {
                        Ok(()) => trace!(task = %name, "executor finished"),
                        Err(err) => {
                            // The receiver outlives every task of the level.
                            let _ = tx.send((name, err)).await;
                        }
                    }
                }));
            }
            drop(tx);

            let _abort = AbortOnDrop(handles.iter().map(tokio::task::JoinHandle::abort_handle).collect());
            let mut panic = None;
            for joined in join_all(handles).await {
                match joined {
                    Ok(()) => {}
                    Err(err) if err.is_panic() => {
                        panic.get_or_insert_with(|| err.into_panic());
                    }
                    Err(err) => warn!(level = index, error = %err, "executor task did not complete"),
                }
            }
            if let Some(panic) = panic {
                std::panic::resume_unwind(panic);
            }

            while let Some((name, err)) = rx.recv().await {
                if let ControlFlow::Break(result) = self.on_failure(ctx, payload, &name, err) {
                    return result;
                }
            }
        }

        Ok(())
    }
}

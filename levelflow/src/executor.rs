//! Executor trait and closure adapters.
//!
//! Executors are the units of work a pipeline orders. They hold no state of
//! their own: everything they read or write lives in the payload, which the
//! caller owns and synchronizes.

use crate::context::RunContext;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Shared handle to an executor, as stored in a pipeline.
pub type ExecutorRef<P, E = anyhow::Error> = Arc<dyn Executor<P, E>>;

/// A named unit of work operating on a shared payload.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use levelflow::{Executor, RunContext, SharedPayload};
/// use std::collections::HashMap;
///
/// struct Milk;
///
/// #[async_trait]
/// impl Executor<SharedPayload<HashMap<String, f64>>> for Milk {
///     async fn execute(
///         &self,
///         _ctx: &RunContext,
///         prices: &SharedPayload<HashMap<String, f64>>,
///     ) -> anyhow::Result<()> {
///         prices.lock().insert("milk".to_string(), 1.0);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Executor<P, E = anyhow::Error>: Send + Sync
where
    P: Send + Sync + 'static,
    E: Send + 'static,
{
    /// Runs the unit of work against the payload.
    async fn execute(&self, ctx: &RunContext, payload: &P) -> Result<(), E>;
}

/// Adapts a synchronous closure into an [`Executor`].
pub struct FnExecutor<F> {
    func: F,
}

impl<F> FnExecutor<F> {
    /// Wraps a closure `Fn(&RunContext, &P) -> Result<(), E>`.
    pub fn new<P, E>(func: F) -> Self
    where
        F: Fn(&RunContext, &P) -> Result<(), E>,
    {
        Self { func }
    }
}

impl<F> fmt::Debug for FnExecutor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExecutor").finish_non_exhaustive()
    }
}

#[async_trait]
impl<P, E, F> Executor<P, E> for FnExecutor<F>
where
    P: Send + Sync + 'static,
    E: Send + 'static,
    F: Fn(&RunContext, &P) -> Result<(), E> + Send + Sync,
{
    async fn execute(&self, ctx: &RunContext, payload: &P) -> Result<(), E> {
        (self.func)(ctx, payload)
    }
}

/// Adapts an async closure into an [`Executor`].
///
/// The closure receives owned clones of the context and the payload, so the
/// returned future does not borrow from the pipeline.
pub struct AsyncFnExecutor<F, Fut> {
    func: F,
    _future: PhantomData<fn() -> Fut>,
}

impl<F, Fut> AsyncFnExecutor<F, Fut> {
    /// Wraps a closure `Fn(RunContext, P) -> impl Future<Output = Result<(), E>>`.
    pub fn new<P, E>(func: F) -> Self
    where
        F: Fn(RunContext, P) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        Self {
            func,
            _future: PhantomData,
        }
    }
}

impl<F, Fut> fmt::Debug for AsyncFnExecutor<F, Fut> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFnExecutor").finish_non_exhaustive()
    }
}

#[async_trait]
impl<P, E, F, Fut> Executor<P, E> for AsyncFnExecutor<F, Fut>
where
    P: Clone + Send + Sync + 'static,
    E: Send + 'static,
    F: Fn(RunContext, P) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), E>> + Send,
{
    async fn execute(&self, ctx: &RunContext, payload: &P) -> Result<(), E> {
        (self.func)(ctx.clone(), payload.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::SharedPayload;
    use anyhow::anyhow;

    type Counter = SharedPayload<u32>;

    #[tokio::test]
    async fn test_fn_executor_mutates_payload() {
        let exec = FnExecutor::new(|_ctx: &RunContext, n: &Counter| -> anyhow::Result<()> {
            *n.lock() += 1;
            Ok(())
        });
        let payload = Counter::new(0);

        exec.execute(&RunContext::new(), &payload).await.unwrap();
        exec.execute(&RunContext::new(), &payload).await.unwrap();

        assert_eq!(*payload.lock(), 2);
    }

    #[tokio::test]
    async fn test_fn_executor_propagates_error() {
        let exec = FnExecutor::new(|_ctx: &RunContext, _n: &Counter| -> anyhow::Result<()> {
            Err(anyhow!("boom"))
        });

        let err = exec
            .execute(&RunContext::new(), &Counter::new(0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn test_async_fn_executor() {
        let exec = AsyncFnExecutor::new(|_ctx: RunContext, n: Counter| async move {
            tokio::task::yield_now().await;
            *n.lock() += 10;
            Ok::<_, anyhow::Error>(())
        });
        let payload = Counter::new(1);

        exec.execute(&RunContext::new(), &payload).await.unwrap();

        assert_eq!(*payload.lock(), 11);
    }

    #[tokio::test]
    async fn test_executor_as_trait_object() {
        let exec: ExecutorRef<Counter> = Arc::new(FnExecutor::new(
            |ctx: &RunContext, n: &Counter| -> anyhow::Result<()> {
                if ctx.is_cancelled() {
                    return Err(anyhow!("cancelled"));
                }
                *n.lock() = 7;
                Ok(())
            },
        ));
        let payload = Counter::new(0);

        exec.execute(&RunContext::new(), &payload).await.unwrap();
        assert_eq!(*payload.lock(), 7);

        let ctx = RunContext::new();
        ctx.cancel("stop");
        assert!(exec.execute(&ctx, &payload).await.is_err());
    }
}

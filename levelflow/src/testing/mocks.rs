//! Mock executors for testing.

use crate::context::RunContext;
use crate::executor::Executor;
use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Something an executor did, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionEvent {
    /// The executor was entered.
    Started(String),
    /// The executor returned, successfully or not.
    Finished(String),
}

/// Shared, thread-safe record of executor activity.
///
/// Clones share the same record, so one log can be handed to every mock of
/// a pipeline and inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    events: Arc<Mutex<Vec<ExecutionEvent>>>,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ExecutionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a task started.
    pub fn start(&self, name: &str) {
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        self.events.lock().push(ExecutionEvent::Started(name.to_string()));
    }

    /// Records that a task finished.
    pub fn finish(&self, name: &str) {
        self.events.lock().push(ExecutionEvent::Finished(name.to_string()));
        self.running.fetch_sub(1, Ordering::SeqCst);
    }

    /// Returns every recorded event.
    #[must_use]
    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events.lock().clone()
    }

    /// Returns task names in the order they started.
    #[must_use]
    pub fn started(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ExecutionEvent::Started(name) => Some(name.clone()),
                ExecutionEvent::Finished(_) => None,
            })
            .collect()
    }

    /// Returns true if the task ever started.
    #[must_use]
    pub fn ran(&self, name: &str) -> bool {
        self.position(&ExecutionEvent::Started(name.to_string())).is_some()
    }

    /// Returns true if `first` finished before `second` started.
    #[must_use]
    pub fn finished_before_started(&self, first: &str, second: &str) -> bool {
        let finished = self.position(&ExecutionEvent::Finished(first.to_string()));
        let started = self.position(&ExecutionEvent::Started(second.to_string()));
        matches!((finished, started), (Some(f), Some(s)) if f < s)
    }

    /// Returns the highest number of tasks observed running at once.
    #[must_use]
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn position(&self, event: &ExecutionEvent) -> Option<usize> {
        self.events.lock().iter().position(|e| e == event)
    }
}

/// A configurable executor that records its activity.
#[derive(Debug)]
pub struct MockExecutor {
    name: String,
    log: ExecutionLog,
    delay: Option<Duration>,
    failure: Mutex<Option<String>>,
    call_count: AtomicUsize,
}

impl MockExecutor {
    /// Creates a mock that succeeds immediately.
    #[must_use]
    pub fn new(name: impl Into<String>, log: &ExecutionLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            delay: None,
            failure: Mutex::new(None),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Creates a mock that fails with the given message.
    #[must_use]
    pub fn failing(name: impl Into<String>, log: &ExecutionLog, message: impl Into<String>) -> Self {
        let mock = Self::new(name, log);
        mock.set_failure(Some(message.into()));
        mock
    }

    /// Makes the mock sleep before returning.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets or clears the failure message.
    pub fn set_failure(&self, message: Option<String>) {
        *self.failure.lock() = message;
    }

    /// Returns the number of times the mock ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<P> Executor<P> for MockExecutor
where
    P: Send + Sync + 'static,
{
    async fn execute(&self, _ctx: &RunContext, _payload: &P) -> anyhow::Result<()> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.log.start(&self.name);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failure.lock().clone();
        self.log.finish(&self.name);

        match failure {
            Some(message) => Err(anyhow!(message)),
            None => Ok(()),
        }
    }
}

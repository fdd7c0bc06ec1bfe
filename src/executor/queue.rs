//! Priority task executor.
//!
//! Work items are queued in a binary heap keyed by `(rank, sequence)` and run
//! one at a time by a single worker task. The worker is spawned on demand and
//! exits as soon as the heap is empty.

use std::any::Any;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::priority::TaskPriority;
use crate::error::{A2aError, Result};
use crate::functions::{AutomationFunction, FunctionParams};

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

struct QueuedTask {
    priority: TaskPriority,
    sequence: u64,
    cancelled: Arc<AtomicBool>,
    job: Job,
}

impl QueuedTask {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::SeqCst)
    }
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops the greatest entry: lowest rank, then lowest sequence.
        other
            .priority
            .rank()
            .cmp(&self.priority.rank())
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

enum WorkerState {
    Idle,
    Running {
        handle: JoinHandle<()>,
        /// Closes once the worker task has been dropped.
        exited: watch::Receiver<()>,
    },
}

struct ExecutorState {
    heap: BinaryHeap<QueuedTask>,
    next_sequence: u64,
    worker: WorkerState,
}

/// Runs submitted work one item at a time in priority order.
///
/// Cloning is cheap and every clone drives the same queue.
#[derive(Clone)]
pub struct PriorityTaskExecutor {
    state: Arc<Mutex<ExecutorState>>,
}

impl Default for PriorityTaskExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityTaskExecutor {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ExecutorState {
                heap: BinaryHeap::new(),
                next_sequence: 0,
                worker: WorkerState::Idle,
            })),
        }
    }

    /// Queue a work factory and return a handle to its result.
    ///
    /// The factory is invoked only when the worker reaches this entry. Dropping
    /// the handle before that point cancels the entry.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime, since the worker is spawned
    /// on the current runtime.
    pub fn enqueue<F, Fut, T>(&self, factory: F, priority: TaskPriority) -> TaskHandle<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let cancelled = Arc::new(AtomicBool::new(false));

        let job: Job = Box::new(move || {
            async move {
                let outcome = AssertUnwindSafe(async move { factory().await })
                    .catch_unwind()
                    .await;
                let result = match outcome {
                    Ok(result) => result,
                    Err(panic) => Err(A2aError::TaskPanicked(panic_message(panic.as_ref()))),
                };
                if let Err(e) = &result {
                    debug!(error = %e, "Task finished with error");
                }
                if tx.send(result).is_err() {
                    debug!("Task result discarded, caller went away");
                }
            }
            .boxed()
        });

        let mut state = self.state.lock();
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.heap.push(QueuedTask {
            priority,
            sequence,
            cancelled: Arc::clone(&cancelled),
            job,
        });
        Self::ensure_worker(&self.state, &mut state);

        TaskHandle {
            receiver: rx,
            cancelled,
            completed: false,
        }
    }

    /// Queue a work factory and wait for its result.
    ///
    /// Errors raised by the work reach only this caller. If this future is
    /// dropped before the work starts, the entry is skipped without running.
    pub async fn submit<F, Fut, T>(&self, factory: F, priority: TaskPriority) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.enqueue(factory, priority).await
    }

    /// Run an automation function with keyword parameters through the queue.
    pub async fn run_function(
        &self,
        function: Arc<dyn AutomationFunction>,
        params: FunctionParams,
        priority: TaskPriority,
    ) -> Result<Value> {
        self.submit(
            move || async move {
                function.validate_inputs(&params)?;
                debug!(function = function.name(), "Executing function");
                function.execute(params).await
            },
            priority,
        )
        .await
    }

    /// Cancel every queued entry that has not started and wait for the worker to exit.
    ///
    /// Work that is already running is allowed to finish. Concurrent callers all
    /// wait on the same worker, and dropping this future leaves the executor
    /// state untouched.
    pub async fn shutdown(&self) {
        let (drained, exited) = {
            let mut state = self.state.lock();
            let drained: Vec<QueuedTask> = state.heap.drain().collect();
            for task in &drained {
                task.cancelled.store(true, AtomicOrdering::SeqCst);
            }
            let exited = match &state.worker {
                WorkerState::Running { exited, .. } => Some(exited.clone()),
                WorkerState::Idle => None,
            };
            (drained, exited)
        };

        if !drained.is_empty() {
            debug!(count = drained.len(), "Cancelled pending tasks");
        }
        // Dropping the jobs drops their result senders, resolving each handle as cancelled.
        drop(drained);

        if let Some(mut exited) = exited {
            // Nothing is ever sent, so this only returns once the sender is dropped.
            while exited.changed().await.is_ok() {}
            debug!("Executor worker stopped");
        }
    }

    /// Number of queued entries that have not started and are not cancelled.
    pub fn pending(&self) -> usize {
        self.state
            .lock()
            .heap
            .iter()
            .filter(|t| !t.is_cancelled())
            .count()
    }

    pub fn is_worker_running(&self) -> bool {
        match &self.state.lock().worker {
            WorkerState::Idle => false,
            WorkerState::Running { handle, .. } => !handle.is_finished(),
        }
    }

    fn ensure_worker(shared: &Arc<Mutex<ExecutorState>>, state: &mut ExecutorState) {
        match &state.worker {
            WorkerState::Running { handle, .. } if !handle.is_finished() => return,
            WorkerState::Running { .. } => {
                warn!("Executor worker died unexpectedly, respawning");
            }
            WorkerState::Idle => {}
        }
        debug!(pending = state.heap.len(), "Spawning executor worker");
        let (exit, exited) = watch::channel(());
        let handle = tokio::spawn(Self::worker_loop(Arc::clone(shared), exit));
        state.worker = WorkerState::Running { handle, exited };
    }

    async fn worker_loop(shared: Arc<Mutex<ExecutorState>>, _exit: watch::Sender<()>) {
        loop {
            let task = {
                let mut state = shared.lock();
                match state.heap.pop() {
                    Some(task) => task,
                    None => {
                        state.worker = WorkerState::Idle;
                        debug!("Executor queue empty, worker exiting");
                        return;
                    }
                }
            };

            if task.is_cancelled() {
                debug!(
                    priority = %task.priority,
                    sequence = task.sequence,
                    "Skipping cancelled task"
                );
                continue;
            }

            (task.job)().await;
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Result handle for queued work.
///
/// Resolves to the work's result, or to [`A2aError::TaskCancelled`] when the
/// entry was cancelled before it started.
pub struct TaskHandle<T> {
    receiver: oneshot::Receiver<Result<T>>,
    cancelled: Arc<AtomicBool>,
    completed: bool,
}

impl<T> TaskHandle<T> {
    /// Mark the entry cancelled. Has no effect once the work has started.
    pub fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::SeqCst)
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(outcome) => {
                this.completed = true;
                Poll::Ready(outcome.unwrap_or_else(|_| Err(A2aError::TaskCancelled)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        if !self.completed {
            self.cancel();
        }
    }
}

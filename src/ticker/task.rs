//! Task types for the ticker

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use eyre::Result;
use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::TickError;

/// Per-submission identifier, assigned by the ticker core
pub(crate) type TaskId = u64;

/// What a callback produced on one attempt.
///
/// The sync-vs-async decision is made by the callback's own return value,
/// not by probing the result at runtime.
pub enum TaskOutput<T> {
    /// Settled synchronously with this value
    Value(T),

    /// Settles later. The ticker keeps pacing the queue and completes the
    /// task whenever this future resolves; a rejection goes through the
    /// retry path like a synchronous failure.
    Deferred(BoxFuture<'static, Result<T>>),
}

/// The unit of work. Invoked with the time elapsed since submission; invoked
/// again on each retry attempt.
pub type TaskFn<T> = Box<dyn FnMut(Duration) -> Result<TaskOutput<T>> + Send>;

/// Per-submission state, owned exclusively by the ticker core from
/// submission until completion.
pub(crate) struct Task<T> {
    pub id: TaskId,
    pub callback: TaskFn<T>,
    pub created: Instant,
    pub retry: u32,
    pub reply: oneshot::Sender<Result<T, TickError>>,
    /// Timeout guard for this task, armed once at submission
    pub guard: Option<JoinHandle<()>>,
}

impl<T> Task<T> {
    /// Finalize the task exactly once: disarm the timeout guard and settle
    /// the caller's handle. Consuming the task removes it from the system,
    /// so later settlement attempts find nothing and are no-ops.
    pub fn finish(mut self, outcome: Result<T, TickError>) {
        if let Some(guard) = self.guard.take() {
            guard.abort();
        }
        // The caller may have dropped its handle; nothing to deliver then.
        let _ = self.reply.send(outcome);
    }
}

/// Caller-side future resolving to a task's terminal outcome.
///
/// Returned by [`TickerHandle::submit`](super::TickerHandle::submit); settles
/// exactly once with the task's value, its final failure, a timeout, or a
/// reset.
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<Result<T, TickError>>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(rx: oneshot::Receiver<Result<T, TickError>>) -> Self {
        Self { rx }
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, TickError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            // Ticker dropped without settling the task: same observable
            // contract as an explicit reset.
            Poll::Ready(Err(_)) => Poll::Ready(Err(TickError::Reset)),
            Poll::Pending => Poll::Pending,
        }
    }
}

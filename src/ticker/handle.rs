//! TickerHandle - client interface to a running ticker

use std::future::Future;
use std::time::Duration;

use eyre::Result;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::debug;

use super::messages::Request;
use super::task::{TaskFn, TaskHandle, TaskOutput};

/// Handle for submitting work to a [`Ticker`](super::Ticker) and issuing
/// control commands.
///
/// Cloneable; every clone talks to the same ticker. Submission never blocks
/// and never fails: the queue is unbounded, and if the ticker has already
/// shut down the returned [`TaskHandle`] settles as reset.
pub struct TickerHandle<T> {
    tx: mpsc::UnboundedSender<Request<T>>,
}

// Not derived: a derived impl would require `T: Clone`.
impl<T> Clone for TickerHandle<T> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<T: Send + 'static> TickerHandle<T> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Request<T>>) -> Self {
        Self { tx }
    }

    /// Enqueue a callback, returning a future of its terminal outcome.
    ///
    /// The callback receives the time elapsed since this call and is invoked
    /// again on each retry attempt.
    pub fn submit<F>(&self, callback: F) -> TaskHandle<T>
    where
        F: FnMut(Duration) -> Result<TaskOutput<T>> + Send + 'static,
    {
        self.submit_boxed(Box::new(callback))
    }

    /// Enqueue work whose result is itself asynchronous. The ticker keeps
    /// pacing while the returned future runs; rejections are retried like
    /// synchronous failures.
    pub fn submit_deferred<F, Fut>(&self, mut callback: F) -> TaskHandle<T>
    where
        F: FnMut(Duration) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.submit(move |elapsed| Ok(TaskOutput::Deferred(Box::pin(callback(elapsed)))))
    }

    /// Enqueue a literal value; it resolves once its turn in the queue comes
    pub fn submit_value(&self, value: T) -> TaskHandle<T>
    where
        T: Clone,
    {
        self.submit(move |_| Ok(TaskOutput::Value(value.clone())))
    }

    fn submit_boxed(&self, callback: TaskFn<T>) -> TaskHandle<T> {
        let (reply, rx) = oneshot::channel();
        let request = Request::Submit {
            callback,
            created: Instant::now(),
            reply,
        };
        if self.tx.send(request).is_err() {
            // Ticker gone; dropping the reply sender settles the handle as
            // reset.
            debug!("submit after ticker shutdown");
        }
        TaskHandle::new(rx)
    }

    /// Halt draining. Queued tasks are preserved; in-flight results and
    /// already-armed timeouts are unaffected.
    pub fn pause(&self) {
        self.send(Request::Pause);
    }

    /// Resume draining
    pub fn resume(&self) {
        self.send(Request::Resume);
    }

    /// Fail every queued task with `Reset`, leaving the queue empty
    pub fn reset(&self) {
        self.send(Request::Reset);
    }

    /// Reset the queue and stop the ticker
    pub fn shutdown(&self) {
        self.send(Request::Shutdown);
    }

    fn send(&self, request: Request<T>) {
        if self.tx.send(request).is_err() {
            debug!("command after ticker shutdown");
        }
    }
}

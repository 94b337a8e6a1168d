//! Message types between handles, timers, and the ticker core

use eyre::Result;
use tokio::sync::oneshot;
use tokio::time::Instant;

use super::task::{TaskFn, TaskId};
use crate::error::TickError;

/// Commands from a handle to the ticker core
pub enum Request<T> {
    /// Enqueue a task at the tail of the queue
    Submit {
        callback: TaskFn<T>,
        /// Submission time as seen by the caller; anchors both the elapsed
        /// argument and the timeout deadline
        created: Instant,
        reply: oneshot::Sender<Result<T, TickError>>,
    },

    /// Halt draining; queued tasks are preserved
    Pause,

    /// Clear the pause flag and re-arm draining
    Resume,

    /// Fail every queued task with `Reset`, leaving the queue empty
    Reset,

    /// Reset the queue, then exit the run loop
    Shutdown,
}

/// Internal events funneled back into the core by its spawned timers and
/// deferred-result drivers. The core is the only place these mutate state,
/// which is what makes the completion races safe without locks.
pub(crate) enum Event<T> {
    /// A pacing wait elapsed; try to drain again
    Tick,

    /// A deferred result settled
    Settled { id: TaskId, result: Result<T> },

    /// A task's deadline elapsed
    TimedOut { id: TaskId },

    /// A backoff wait elapsed; the task may rejoin the queue
    RetryDue { id: TaskId },
}

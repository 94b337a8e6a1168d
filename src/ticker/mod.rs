//! Paced FIFO execution of asynchronous work
//!
//! The ticker accepts an unbounded stream of tasks and executes them
//! strictly in submission order, enforcing a minimum spacing between the
//! start times of consecutive executions, with:
//! - **Timeouts:** a per-task deadline from submission, spanning retries
//! - **Retries:** automatic re-submission with backoff on failure
//! - **Control:** pause / resume / reset of the queue

mod config;
mod core;
mod handle;
mod messages;
mod task;

pub use config::{BackoffFn, BackoffPolicy, TickerConfig};
pub use core::Ticker;
pub use handle::TickerHandle;
pub use task::{TaskFn, TaskHandle, TaskOutput};

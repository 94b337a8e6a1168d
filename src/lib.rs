//! task-ticker - paced FIFO scheduling for asynchronous work
//!
//! A pacing scheduler: submit callables, have them executed strictly in
//! submission order with a minimum elapsed time between consecutive starts,
//! with per-task absolute timeouts and automatic retry-with-backoff.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use task_ticker::{TaskOutput, Ticker, TickerConfig};
//!
//! # async fn example() {
//! let handle = Ticker::spawn(TickerConfig::from(Duration::from_millis(100)));
//!
//! let first = handle.submit(|_elapsed| Ok(TaskOutput::Value("first")));
//! let second = handle.submit(|_elapsed| Ok(TaskOutput::Value("second")));
//!
//! // The first runs immediately; the second no earlier than 100ms later.
//! assert_eq!(first.await.unwrap(), "first");
//! assert_eq!(second.await.unwrap(), "second");
//! # }
//! ```
//!
//! # Modules
//!
//! - [`ticker`] - the scheduler core, its handle, and configuration
//! - [`error`] - the failure taxonomy (task failure, timeout, reset)

pub mod error;
pub mod ticker;

pub use error::TickError;
pub use ticker::{BackoffFn, BackoffPolicy, TaskFn, TaskHandle, TaskOutput, Ticker, TickerConfig, TickerHandle};

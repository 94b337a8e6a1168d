//! Ticker core: the single task that owns the queue and every pacing,
//! retry, and completion decision.
//!
//! All queue mutation and lifecycle transitions happen inside [`Ticker::run`].
//! Timers and deferred results never touch state directly; they report back
//! through the internal event channel, so arbitrary interleavings of
//! success, failure, and timeout collapse to a message ordering problem the
//! core resolves one event at a time.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use eyre::Report;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::config::{BackoffFn, TickerConfig};
use super::handle::TickerHandle;
use super::messages::{Event, Request};
use super::task::{Task, TaskFn, TaskId, TaskOutput};
use crate::error::TickError;

/// Paced FIFO scheduler for asynchronous tasks.
///
/// Tasks execute strictly in submission order with at least the configured
/// interval between consecutive start times. Each task carries an absolute
/// deadline from submission and a retry budget with backoff.
pub struct Ticker<T> {
    config: TickerConfig,
    backoff: BackoffFn,

    /// Minting sender for `handle()`. Dropped when `run` starts, so the
    /// request channel stays open exactly as long as a handle is alive.
    tx: Option<mpsc::UnboundedSender<Request<T>>>,
    rx: mpsc::UnboundedReceiver<Request<T>>,
    events_tx: mpsc::UnboundedSender<Event<T>>,
    events_rx: mpsc::UnboundedReceiver<Event<T>>,

    paused: bool,
    queue: VecDeque<Task<T>>,
    /// Dequeued tasks whose deferred result has not settled yet
    inflight: HashMap<TaskId, Task<T>>,
    /// Failed tasks sitting out a backoff wait
    waiting: HashMap<TaskId, Task<T>>,
    /// Start time of the most recent execution; `None` until the first run,
    /// so the first task always runs immediately
    last_run: Option<Instant>,
    /// At most one pacing continuation is outstanding at a time
    tick_armed: bool,
    next_id: TaskId,
}

impl<T: Send + 'static> Ticker<T> {
    /// Create a new ticker with the given configuration
    pub fn new(config: TickerConfig) -> Self {
        let backoff = config.backoff.into_fn(config.interval());
        Self::build(config, backoff)
    }

    /// Create a ticker with a custom backoff curve, overriding the
    /// configured policy
    pub fn with_backoff_fn(config: TickerConfig, backoff: impl Fn(u32) -> Duration + Send + 'static) -> Self {
        Self::build(config, Box::new(backoff))
    }

    fn build(config: TickerConfig, backoff: BackoffFn) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            config,
            backoff,
            tx: Some(tx),
            rx,
            events_tx,
            events_rx,
            paused: false,
            queue: VecDeque::new(),
            inflight: HashMap::new(),
            waiting: HashMap::new(),
            last_run: None,
            tick_armed: false,
            next_id: 0,
        }
    }

    /// Create a handle for submitting work and issuing control commands
    pub fn handle(&self) -> TickerHandle<T> {
        match &self.tx {
            Some(tx) => TickerHandle::new(tx.clone()),
            // `run` consumes the ticker, so this is unreachable through the
            // public API; a handle on a closed channel keeps the contract
            // anyway (submissions settle as reset).
            None => {
                let (tx, _rx) = mpsc::unbounded_channel();
                TickerHandle::new(tx)
            }
        }
    }

    /// Create a ticker, run it on the current tokio runtime, and return its
    /// handle
    pub fn spawn(config: TickerConfig) -> TickerHandle<T> {
        let ticker = Self::new(config);
        let handle = ticker.handle();
        tokio::spawn(ticker.run());
        handle
    }

    /// Run the ticker task
    ///
    /// Consumes the ticker and runs until `shutdown()` is requested or every
    /// handle has been dropped and the in-system work has drained.
    pub async fn run(mut self) {
        debug!(config = ?self.config, "ticker started");

        // Drop the minting sender: the handles now hold the only senders, so
        // `recv` returns `None` once every one of them is gone.
        self.tx = None;
        let mut closed = false;

        loop {
            tokio::select! {
                request = self.rx.recv(), if !closed => match request {
                    Some(request) => {
                        if !self.handle_request(request) {
                            break;
                        }
                    }
                    None => {
                        // Every handle is gone; nothing new can arrive.
                        // Finish what is already in the system, then exit.
                        // A paused queue can never be resumed, so drain it.
                        debug!("all handles dropped, draining");
                        closed = true;
                        if self.paused {
                            self.reset();
                        }
                        self.tick();
                    }
                },
                Some(event) = self.events_rx.recv() => self.handle_event(event),
            }

            if closed && self.is_idle() {
                break;
            }
        }

        self.reset();
        debug!("ticker stopped");
    }

    /// Returns false when the run loop should exit
    fn handle_request(&mut self, request: Request<T>) -> bool {
        match request {
            Request::Submit { callback, created, reply } => {
                self.submit(callback, created, reply);
            }
            Request::Pause => {
                debug!("paused");
                self.paused = true;
            }
            Request::Resume => {
                debug!("resumed");
                self.paused = false;
                self.tick();
            }
            Request::Reset => {
                self.reset();
            }
            Request::Shutdown => {
                debug!("shutdown requested");
                return false;
            }
        }
        true
    }

    fn handle_event(&mut self, event: Event<T>) {
        match event {
            Event::Tick => {
                self.tick_armed = false;
                self.tick();
            }
            Event::Settled { id, result } => self.on_settled(id, result),
            Event::TimedOut { id } => self.on_timeout(id),
            Event::RetryDue { id } => self.on_retry_due(id),
        }
    }

    fn submit(
        &mut self,
        callback: TaskFn<T>,
        created: Instant,
        reply: tokio::sync::oneshot::Sender<Result<T, TickError>>,
    ) {
        let id = self.next_id;
        self.next_id += 1;

        let mut task = Task {
            id,
            callback,
            created,
            retry: 0,
            reply,
            guard: None,
        };

        // The guard fires once, the configured timeout after submission,
        // regardless of retries or queue position. It is aborted when the
        // task completes by any other path.
        if let Some(timeout) = self.config.timeout() {
            let deadline = created + timeout;
            let events = self.events_tx.clone();
            task.guard = Some(tokio::spawn(async move {
                tokio::time::sleep_until(deadline).await;
                let _ = events.send(Event::TimedOut { id });
            }));
        }

        debug!(id, queued = self.queue.len(), "task submitted");
        self.queue.push_back(task);
        self.tick();
    }

    /// Drain the queue subject to pacing.
    ///
    /// With `interval > 0` the loop executes at most one task per pass: the
    /// re-check after an execution sees an elapsed time near zero and arms a
    /// single pacing timer instead. `interval == 0` falls through the check
    /// unconditionally and drains the whole backlog.
    fn tick(&mut self) {
        loop {
            if self.paused {
                return;
            }

            let now = Instant::now();
            if let Some(last) = self.last_run {
                let elapsed = now.duration_since(last);
                let interval = self.config.interval();
                if elapsed < interval && !self.queue.is_empty() {
                    self.arm_tick(interval - elapsed);
                    return;
                }
            }

            let Some(task) = self.queue.pop_front() else {
                return;
            };
            self.last_run = Some(now);
            self.execute(task);
        }
    }

    fn arm_tick(&mut self, delay: Duration) {
        if self.tick_armed {
            return;
        }
        self.tick_armed = true;
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(Event::Tick);
        });
    }

    fn execute(&mut self, mut task: Task<T>) {
        let elapsed = task.created.elapsed();
        debug!(id = task.id, ?elapsed, retry = task.retry, "executing task");

        match (task.callback)(elapsed) {
            Ok(TaskOutput::Value(value)) => task.finish(Ok(value)),
            Ok(TaskOutput::Deferred(fut)) => {
                // Pacing does not wait for the deferred result; only this
                // task's own completion is delayed.
                let id = task.id;
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = fut.await;
                    let _ = events.send(Event::Settled { id, result });
                });
                self.inflight.insert(id, task);
            }
            Err(error) => self.fail(task, error),
        }
    }

    /// Route a failed attempt into retry or final rejection
    fn fail(&mut self, mut task: Task<T>, error: Report) {
        if task.retry >= self.config.retries {
            debug!(id = task.id, retry = task.retry, %error, "task failed, retries exhausted");
            task.finish(Err(TickError::Task(error)));
            return;
        }

        task.retry += 1;
        let delay = (self.backoff)(task.retry);
        debug!(id = task.id, retry = task.retry, ?delay, %error, "task failed, backing off");

        // The timeout guard stays armed across retries: the deadline is
        // measured from submission, so total time across all attempts is
        // still bounded.
        let id = task.id;
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(Event::RetryDue { id });
        });
        self.waiting.insert(id, task);
    }

    fn on_settled(&mut self, id: TaskId, result: eyre::Result<T>) {
        // A settlement arriving after a timeout or reset finds nothing here.
        let Some(task) = self.inflight.remove(&id) else {
            return;
        };
        match result {
            Ok(value) => task.finish(Ok(value)),
            Err(error) => self.fail(task, error),
        }
    }

    fn on_timeout(&mut self, id: TaskId) {
        // The task may be queued, awaiting a deferred result, or sitting out
        // a backoff wait; whichever holds it, the timeout wins and the retry
        // path is bypassed.
        let task = if let Some(pos) = self.queue.iter().position(|t| t.id == id) {
            self.queue.remove(pos)
        } else {
            self.inflight.remove(&id).or_else(|| self.waiting.remove(&id))
        };

        let Some(task) = task else {
            return;
        };
        warn!(id, "task timed out");
        task.finish(Err(TickError::Timeout));
    }

    fn on_retry_due(&mut self, id: TaskId) {
        // Absent when the timeout guard fired during the backoff wait
        let Some(task) = self.waiting.remove(&id) else {
            return;
        };
        debug!(id, retry = task.retry, "re-queueing task for retry");
        self.queue.push_back(task);
        self.tick();
    }

    /// Fail every queued task with `Reset`. Tasks already executing or in a
    /// backoff wait are not in the queue and are unaffected.
    fn reset(&mut self) {
        let drained = self.queue.len();
        while let Some(task) = self.queue.pop_front() {
            task.finish(Err(TickError::Reset));
        }
        if drained > 0 {
            debug!(drained, "queue reset");
        }
    }

    fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.inflight.is_empty() && self.waiting.is_empty()
    }
}

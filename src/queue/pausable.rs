//! Pausable, aggregating queue wrapper
//!
//! Wraps a [`Queue`] with:
//! - a pause/resume gate on consumption (pushes are always accepted)
//! - an ordered aggregator chain applied to every push
//! - a terminal stop state that releases blocked consumers
//!
//! ```text
//!              pause()            stop()
//!   Resumed ─────────────▶ Paused ───────▶ Stopped
//!      ▲  ◀───────────────   │               ▲
//!      │      resume()       │               │
//!      └─────────────────────┴───── stop() ──┘
//! ```

use crate::core::shutdown::ShutdownSignal;
use crate::queue::aggregator::Aggregator;
use crate::queue::base::{PushOutcome, Queue};
use crate::queue::config::QueueOptions;
use std::fmt;
use strum_macros::Display;
use tokio::sync::watch;

/// Consumption state of a [`PausableQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum QueueState {
    Resumed,
    Paused,
    /// Terminal; no further items are handed out
    Stopped,
}

/// Queue whose consumption can be paused and which merges items on push
///
/// Configure it (aggregators, size) through `&mut self` before sharing it;
/// once it is behind an `Arc` only pushes, pulls and state changes are
/// possible.
///
/// # Example
///
/// ```rust
/// use eventq::queue::api::{aggregator, PausableQueue};
///
/// // (deployment id, revision)
/// let mut queue = PausableQueue::new();
/// queue.add_aggregator(aggregator::replace_by_key(|event: &(u32, u32)| event.0));
///
/// queue.push((7, 1));
/// queue.push((7, 2)); // supersedes revision 1
///
/// queue.pause();
/// assert_eq!(queue.pull(), None);
///
/// queue.resume();
/// assert_eq!(queue.pull(), Some((7, 2)));
/// ```
pub struct PausableQueue<T> {
    queue: Queue<T>,
    aggregators: Vec<Aggregator<T>>,
    state: watch::Sender<QueueState>,
}

impl<T> Default for PausableQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PausableQueue<T> {
    /// Create an unbounded queue with no aggregators, in the resumed state
    pub fn new() -> Self {
        Self::with_options(QueueOptions::new())
    }

    /// Create a queue from options, pre-registering their aggregators
    pub fn with_options(mut options: QueueOptions<T>) -> Self {
        let aggregators = std::mem::take(&mut options.aggregators);
        let (state, _) = watch::channel(QueueState::Resumed);

        Self {
            queue: Queue::with_options(options),
            aggregators,
            state,
        }
    }

    /// Append an aggregator to the chain
    pub fn add_aggregator(&mut self, aggregator: Aggregator<T>) {
        self.aggregators.push(aggregator);
    }

    /// Set the maximum queue length, 0 for unbounded
    pub fn set_size(&mut self, max_size: usize) {
        self.queue.set_max_size(max_size);
    }

    pub fn name(&self) -> &str {
        self.queue.name()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn state(&self) -> QueueState {
        *self.state.borrow()
    }

    pub fn is_paused(&self) -> bool {
        self.state() == QueueState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == QueueState::Stopped
    }

    /// Push an item, merging it into the most recent item when an aggregator
    /// matches
    ///
    /// Accepted in every state. Items pushed after [`stop`](Self::stop) are
    /// stored but never handed out.
    pub fn push(&self, item: T) -> PushOutcome {
        self.queue.push_or_merge(item, &self.aggregators)
    }

    /// Remove the front item without blocking; `None` unless resumed
    pub fn pull(&self) -> Option<T> {
        match self.state() {
            QueueState::Resumed => self.queue.pull(),
            QueueState::Paused | QueueState::Stopped => None,
        }
    }

    /// Wait for an item while resumed
    ///
    /// While paused this waits for a resume. Returns `None` once the queue is
    /// stopped or `shutdown` fires, and never hands out an item while paused.
    pub async fn pull_blocking(&self, shutdown: &ShutdownSignal) -> Option<T> {
        let mut state = self.state.subscribe();

        loop {
            let current = *state.borrow_and_update();
            match current {
                QueueState::Stopped => return None,
                QueueState::Paused => {
                    tokio::select! {
                        biased;
                        _ = shutdown.triggered() => return None,
                        _ = state.changed() => {}
                    }
                }
                QueueState::Resumed => {
                    // The base pull is cancel-safe, so losing the race to a
                    // state change cannot drop an item
                    tokio::select! {
                        biased;
                        _ = state.changed() => {}
                        item = self.queue.pull_blocking(shutdown) => return item,
                    }
                }
            }
        }
    }

    pub fn pause(&self) {
        self.transition(QueueState::Paused);
    }

    pub fn resume(&self) {
        self.transition(QueueState::Resumed);
    }

    /// Permanently stop consumption and release blocked consumers; idempotent
    pub fn stop(&self) {
        self.transition(QueueState::Stopped);
    }

    /// Wait until the queue has been stopped
    pub async fn stopped(&self) {
        let mut state = self.state.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = state.wait_for(|state| *state == QueueState::Stopped).await;
    }

    fn transition(&self, next: QueueState) {
        self.state.send_if_modified(|state| {
            if *state == next || *state == QueueState::Stopped {
                return false;
            }
            log::debug!("Queue '{}': {} -> {}", self.queue.name(), state, next);
            *state = next;
            true
        });
    }
}

impl<T> fmt::Debug for PausableQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PausableQueue")
            .field("queue", &self.queue)
            .field("aggregators", &self.aggregators.len())
            .field("state", &self.state())
            .finish()
    }
}

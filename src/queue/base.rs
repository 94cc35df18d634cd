//! Base FIFO queue with drop-on-overflow and blocking pull
//!
//! This module provides the leaf queue component:
//! - Mutex-protected FIFO sequence, never locked across an await
//! - Optional maximum size with drop-and-warn overflow policy
//! - Optional added/removed operation counters
//! - Blocking pull woken by pushes and cancellable by a [`ShutdownSignal`]

use crate::core::shutdown::ShutdownSignal;
use crate::queue::aggregator::Aggregator;
use crate::queue::config::QueueOptions;
use crate::queue::metrics::{OperationCounter, QueueOperation};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Result of a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Item was appended at the back of the queue
    Appended,
    /// Item was folded into the most recently queued item by an aggregator
    Merged,
    /// Queue was at its maximum size; the item was discarded
    Dropped,
}

/// Thread-safe FIFO queue
///
/// `Queue` never fails: a push either appends, merges or drops, and a pull
/// either yields an item or `None`. Share it between tasks behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use eventq::queue::api::{Queue, QueueOptions};
///
/// let queue = Queue::with_options(QueueOptions::new().max_size(2));
/// queue.push("a");
/// queue.push("b");
/// queue.push("c"); // dropped, queue is full
///
/// assert_eq!(queue.pull(), Some("a"));
/// assert_eq!(queue.pull(), Some("b"));
/// assert_eq!(queue.pull(), None);
/// ```
pub struct Queue<T> {
    name: String,
    items: Mutex<VecDeque<T>>,
    max_size: usize,
    counter: Option<Arc<dyn OperationCounter>>,
    /// Woken on every append; waiters re-check the sequence, which gives the
    /// signal level-triggered semantics
    wake: Notify,
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Queue<T> {
    /// Create an unbounded, uninstrumented queue
    pub fn new() -> Self {
        Self::with_options(QueueOptions::new())
    }

    /// Create a queue from construction options
    ///
    /// Aggregators in the options are not used by the base queue; they are
    /// consumed by [`PausableQueue`](crate::queue::pausable::PausableQueue).
    pub fn with_options(options: QueueOptions<T>) -> Self {
        Self {
            name: options.name,
            items: Mutex::new(VecDeque::new()),
            max_size: options.max_size,
            counter: options.counter,
            wake: Notify::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum queue length, 0 when unbounded
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Reconfigure the maximum queue length
    ///
    /// Items already queued beyond a lowered bound are kept; only later
    /// pushes are dropped.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Append an item, or drop it if the queue is full
    pub fn push(&self, item: T) -> PushOutcome {
        let outcome = {
            let mut items = self.items();
            self.append(&mut items, item)
        };
        self.after_push(outcome);
        outcome
    }

    /// Fold an item into the most recently queued one, or append it
    ///
    /// Each aggregator is offered `(back, item)` in order; the first
    /// `Some(merged)` replaces the back item in place and the push is done.
    /// When nothing matches (or the queue is empty) this behaves like
    /// [`push`](Self::push). The check and the replacement happen under a
    /// single lock acquisition.
    pub fn push_or_merge(&self, item: T, aggregators: &[Aggregator<T>]) -> PushOutcome {
        let outcome = {
            let mut items = self.items();
            let merged = items
                .back_mut()
                .is_some_and(|existing| merge_into(existing, &item, aggregators));
            if merged {
                PushOutcome::Merged
            } else {
                self.append(&mut items, item)
            }
        };
        self.after_push(outcome);
        outcome
    }

    /// Remove and return the front item without blocking
    pub fn pull(&self) -> Option<T> {
        let item = self.items().pop_front();
        if item.is_some() {
            self.record(QueueOperation::Removed);
        }
        item
    }

    /// Wait for an item, or until `shutdown` is triggered
    ///
    /// Returns `None` only once the shutdown signal has fired. Any number of
    /// tasks may wait concurrently; a waiter that loses the race for an item
    /// goes back to waiting. Dropping the returned future never loses an
    /// item.
    pub async fn pull_blocking(&self, shutdown: &ShutdownSignal) -> Option<T> {
        loop {
            if shutdown.is_triggered() {
                return None;
            }

            // Register for the wake-up before checking, so a push between the
            // check and the wait is not lost
            let notified = self.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(item) = self.pull() {
                return Some(item);
            }

            tokio::select! {
                biased;
                _ = shutdown.triggered() => return None,
                _ = &mut notified => {}
            }
        }
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<T>> {
        // The sequence is only mutated by single VecDeque calls, so a panic
        // in another holder cannot leave it inconsistent
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append(&self, items: &mut VecDeque<T>, item: T) -> PushOutcome {
        if self.max_size > 0 && items.len() >= self.max_size {
            return PushOutcome::Dropped;
        }
        items.push_back(item);
        PushOutcome::Appended
    }

    // Side effects run outside the lock
    fn after_push(&self, outcome: PushOutcome) {
        match outcome {
            PushOutcome::Appended => {
                self.record(QueueOperation::Added);
                self.wake.notify_waiters();
            }
            PushOutcome::Merged => {
                log::trace!("Queue '{}': item merged into most recent entry", self.name);
            }
            PushOutcome::Dropped => {
                log::warn!(
                    "Queue '{}' is full (max size: {}); dropping item",
                    self.name,
                    self.max_size
                );
            }
        }
    }

    fn record(&self, operation: QueueOperation) {
        if let Some(counter) = &self.counter {
            counter.increment(&self.name, operation);
        }
    }
}

fn merge_into<T>(existing: &mut T, incoming: &T, aggregators: &[Aggregator<T>]) -> bool {
    for aggregate in aggregators {
        if let Some(merged) = aggregate(&*existing, incoming) {
            *existing = merged;
            return true;
        }
    }
    false
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("name", &self.name)
            .field("len", &self.len())
            .field("max_size", &self.max_size)
            .finish()
    }
}

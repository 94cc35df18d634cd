//! Operation counters for queue instrumentation
//!
//! A queue can be given an [`OperationCounter`] sink that is incremented on
//! every successful append ([`QueueOperation::Added`]) and every successful
//! removal ([`QueueOperation::Removed`]). The queue behaves identically with
//! or without one.

use std::sync::atomic::{AtomicU64, Ordering};
use strum_macros::{AsRefStr, Display, EnumIter};

/// Counted queue operation, labelled "added" / "removed"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum QueueOperation {
    Added,
    Removed,
}

/// Counter sink attached to a queue at construction
///
/// Called outside the queue lock, with the queue's name as the first label.
/// Any `Fn(&str, QueueOperation)` closure is a counter, which makes it easy
/// to forward into an external metrics registry.
pub trait OperationCounter: Send + Sync {
    fn increment(&self, queue: &str, operation: QueueOperation);
}

impl<F> OperationCounter for F
where
    F: Fn(&str, QueueOperation) + Send + Sync,
{
    fn increment(&self, queue: &str, operation: QueueOperation) {
        self(queue, operation)
    }
}

/// In-process counter pair for queues that need no external registry
#[derive(Debug, Default)]
pub struct AtomicOperationCounter {
    added: AtomicU64,
    removed: AtomicU64,
}

impl AtomicOperationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn added(&self) -> u64 {
        self.added.load(Ordering::Relaxed)
    }

    pub fn removed(&self) -> u64 {
        self.removed.load(Ordering::Relaxed)
    }

    /// Items added but not yet removed
    ///
    /// Merged and dropped pushes are never counted, so this tracks the
    /// queue length when the counter is attached to a single queue.
    pub fn in_flight(&self) -> u64 {
        self.added().saturating_sub(self.removed())
    }
}

impl OperationCounter for AtomicOperationCounter {
    fn increment(&self, _queue: &str, operation: QueueOperation) {
        match operation {
            QueueOperation::Added => self.added.fetch_add(1, Ordering::Relaxed),
            QueueOperation::Removed => self.removed.fetch_add(1, Ordering::Relaxed),
        };
    }
}

//! Public API for the queue system
//!
//! External modules should import from here rather than directly from the
//! component modules.

// Queue components
pub use crate::queue::base::{PushOutcome, Queue};
pub use crate::queue::channel::{ChannelQueue, QueueReceiver};
pub use crate::queue::pausable::{PausableQueue, QueueState};

// Construction and configuration
pub use crate::queue::aggregator::{self, Aggregator};
pub use crate::queue::config::{QueueConfig, QueueOptions, DEFAULT_QUEUE_NAME};

// Instrumentation
pub use crate::queue::metrics::{AtomicOperationCounter, OperationCounter, QueueOperation};

// Error handling
pub use crate::queue::error::{QueueError, QueueResult};

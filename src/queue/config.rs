//! Queue construction options and TOML configuration
//!
//! [`QueueOptions`] is the builder every queue constructor accepts.
//! [`QueueConfig`] is its serialisable subset, loaded from a TOML document
//! either at the top level or under a `[queue]` table:
//!
//! ```toml
//! [queue]
//! name = "network-flows"
//! max_size = 10000
//! ```

use crate::queue::aggregator::Aggregator;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::metrics::OperationCounter;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Name used in logs and counter labels when none is configured
pub const DEFAULT_QUEUE_NAME: &str = "queue";

/// Builder for queue construction
///
/// # Example
///
/// ```rust
/// use eventq::queue::api::{aggregator, AtomicOperationCounter, PausableQueue, QueueOptions};
/// use std::sync::Arc;
///
/// let counter = Arc::new(AtomicOperationCounter::new());
/// let options = QueueOptions::new()
///     .name("process-indicators")
///     .max_size(1_000)
///     .counter(counter.clone())
///     .aggregator(aggregator::dedup::<String>());
///
/// let queue = PausableQueue::with_options(options);
/// queue.push("exec /bin/sh".to_string());
/// queue.push("exec /bin/sh".to_string());
///
/// assert_eq!(queue.len(), 1);
/// assert_eq!(counter.added(), 1);
/// ```
pub struct QueueOptions<T> {
    pub(crate) name: String,
    pub(crate) max_size: usize,
    pub(crate) counter: Option<Arc<dyn OperationCounter>>,
    pub(crate) aggregators: Vec<Aggregator<T>>,
}

impl<T> Default for QueueOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> QueueOptions<T> {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_QUEUE_NAME.to_string(),
            max_size: 0,
            counter: None,
            aggregators: Vec::new(),
        }
    }

    /// Label for logs and counter calls
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Bound the queue length; pushes beyond it are dropped. 0 = unbounded
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Attach an added/removed counter sink
    pub fn counter(mut self, counter: Arc<dyn OperationCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Pre-register an aggregator; may be called repeatedly
    pub fn aggregator(mut self, aggregator: Aggregator<T>) -> Self {
        self.aggregators.push(aggregator);
        self
    }
}

impl<T> fmt::Debug for QueueOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueOptions")
            .field("name", &self.name)
            .field("max_size", &self.max_size)
            .field("counter", &self.counter.is_some())
            .field("aggregators", &self.aggregators.len())
            .finish()
    }
}

/// Serialisable queue settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    pub name: Option<String>,
    pub max_size: usize,
}

impl QueueConfig {
    /// Parse settings from a TOML document
    pub fn from_toml_str(contents: &str) -> QueueResult<Self> {
        let table = toml::from_str::<toml::Table>(contents).map_err(|e| {
            QueueError::Configuration {
                message: format!("failed to parse TOML: {}", e),
            }
        })?;
        Self::from_toml_table(&table)
    }

    /// Extract settings from a parsed TOML table
    ///
    /// Reads the `[queue]` sub-table when present, otherwise the table
    /// itself.
    pub fn from_toml_table(table: &toml::Table) -> QueueResult<Self> {
        let section = match table.get("queue") {
            Some(toml::Value::Table(queue)) => queue.clone(),
            Some(other) => {
                return Err(QueueError::Configuration {
                    message: format!("'queue' must be a table, found {}", other.type_str()),
                })
            }
            None => table.clone(),
        };

        toml::Value::Table(section)
            .try_into()
            .map_err(|e| QueueError::Configuration {
                message: e.to_string(),
            })
    }

    /// Convert into construction options
    pub fn into_options<T>(self) -> QueueOptions<T> {
        let options = QueueOptions::new().max_size(self.max_size);
        match self.name {
            Some(name) => options.name(name),
            None => options,
        }
    }
}

//! Pausable, Aggregating Work Queue
//!
//! A single-consumer work queue that decouples fast, bursty producers
//! (deployment, network-flow, process and file-activity detectors) from a
//! slower downstream stage.
//!
//! # Overview
//!
//! Three layered components, leaves first:
//!
//! - **[`Queue`]**: mutex-protected FIFO with optional size bound
//!   (drop-on-overflow), optional operation counters, and a blocking pull
//!   cancellable by a [`ShutdownSignal`](crate::core::shutdown::ShutdownSignal)
//! - **[`PausableQueue`]**: adds a pause/resume gate on consumption and an
//!   ordered aggregator chain that merges a pushed item into the most recent
//!   queued item
//! - **[`ChannelQueue`]**: runs one pump task that forwards items from a
//!   pausable queue onto a single-slot channel until stopped
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐ ┌────────────┐ ┌────────────┐
//! │ Producer A │ │ Producer B │ │ Producer C │
//! └─────┬──────┘ └─────┬──────┘ └─────┬──────┘
//!       │ push         │ push         │ push     (never blocks)
//!       ▼              ▼              ▼
//! ┌──────────────────────────────────────────┐
//! │ ChannelQueue                             │
//! │  ┌────────────────────────────────────┐  │
//! │  │ PausableQueue   aggregators ──▶ ▣  │  │
//! │  │  ┌───┬───┬───┬───┬───┐             │  │
//! │  │  │ 1 │ 2 │ 3 │ 4 │ ▣ │  Queue      │  │
//! │  │  └───┴───┴───┴───┴───┘             │  │
//! │  └───────────────┬────────────────────┘  │
//! │                  │ pull_blocking         │
//! │            ┌─────▼─────┐                 │
//! │            │ pump task │                 │
//! │            └─────┬─────┘                 │
//! └──────────────────┼───────────────────────┘
//!                    │ single-slot channel   (backpressure stops here)
//!              ┌─────▼─────┐
//!              │ Consumer  │
//!              └───────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use eventq::core::shutdown::ShutdownSignal;
//! use eventq::queue::api::{aggregator, ChannelQueue, QueueOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let shutdown = ShutdownSignal::with_os_signals();
//!
//! let options = QueueOptions::new()
//!     .name("deployments")
//!     .max_size(10_000)
//!     .aggregator(aggregator::replace_by_key(|update: &(String, u64)| update.0.clone()));
//! let queue = ChannelQueue::with_options(options, shutdown.clone());
//!
//! let mut updates = queue.pull()?;
//! queue.start()?;
//!
//! queue.push(("web".to_string(), 1));
//! queue.push(("web".to_string(), 2)); // replaces revision 1 if still queued
//!
//! while let Some((deployment, revision)) = updates.recv().await {
//!     println!("reconciling {} at revision {}", deployment, revision);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod api;
pub mod base;
pub mod channel;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pausable;

pub use base::{PushOutcome, Queue};
pub use channel::{ChannelQueue, QueueReceiver};
pub use error::{QueueError, QueueResult};
pub use pausable::{PausableQueue, QueueState};

#[cfg(test)]
mod tests;

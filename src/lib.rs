//! Pausable, aggregating single-consumer work queue
//!
//! See [`queue`] for the queue components and [`core`] for the shared
//! shutdown, logging and synchronisation infrastructure they build on.

pub mod core;
pub mod queue;

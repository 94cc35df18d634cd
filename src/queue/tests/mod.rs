//! Test modules for the queue system
//!
//! Tests are organised by functional area; unit tests for individual
//! components live next to them.

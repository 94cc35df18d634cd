//! Common test utilities and helpers
//!
//! Shared event fixtures and bounded-wait helpers for the queue integration
//! tests.

#![allow(dead_code)]

use eventq::queue::api::{aggregator, Aggregator, QueueReceiver};
use std::time::Duration;
use tokio::time::timeout;

/// Upper bound for any single wait on the output channel
pub const RECV_TIMEOUT: Duration = Duration::from_millis(500);

/// Detector event as produced by the collectors feeding the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Deployment { name: String, revision: u64 },
    ProcessExec { pod: String, binary: String },
    FileAccess { path: String },
}

impl Detection {
    pub fn deployment(name: &str, revision: u64) -> Self {
        Detection::Deployment {
            name: name.to_string(),
            revision,
        }
    }

    pub fn process(pod: &str, binary: &str) -> Self {
        Detection::ProcessExec {
            pod: pod.to_string(),
            binary: binary.to_string(),
        }
    }

    pub fn file(path: &str) -> Self {
        Detection::FileAccess {
            path: path.to_string(),
        }
    }
}

/// Newer revisions of the same deployment supersede the queued one
pub fn latest_deployment() -> Aggregator<Detection> {
    aggregator::from_fn(|existing: &Detection, incoming: &Detection| match (existing, incoming) {
        (
            Detection::Deployment { name: a, revision: old },
            Detection::Deployment { name: b, revision: new },
        ) if a == b && new >= old => Some(incoming.clone()),
        _ => None,
    })
}

/// Receive one item, failing the test if nothing arrives in time
pub async fn recv_within<T>(output: &mut QueueReceiver<T>) -> Option<T> {
    timeout(RECV_TIMEOUT, output.recv())
        .await
        .expect("timed out waiting on the output channel")
}

/// Assert that nothing is delivered for a short quiet period
pub async fn assert_quiet<T: std::fmt::Debug>(output: &mut QueueReceiver<T>) {
    if let Ok(item) = timeout(Duration::from_millis(100), output.recv()).await {
        panic!("expected no delivery, got {:?}", item);
    }
}

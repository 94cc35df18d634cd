//! Push-time aggregation functions
//!
//! An aggregator decides whether a newly pushed item can be folded into the
//! most recently queued one. It is called as `(existing, incoming)` and
//! returns `Some(merged)` to replace the existing item in place, or `None`
//! to let the push append normally. Aggregators are pure: the queue owns the
//! replacement.
//!
//! Chains are evaluated in registration order and the first match wins.

use std::sync::Arc;

/// Shared aggregation function, `(existing, incoming) -> merged`
pub type Aggregator<T> = Arc<dyn Fn(&T, &T) -> Option<T> + Send + Sync>;

/// Wrap a closure as an [`Aggregator`]
pub fn from_fn<T, F>(aggregate: F) -> Aggregator<T>
where
    F: Fn(&T, &T) -> Option<T> + Send + Sync + 'static,
{
    Arc::new(aggregate)
}

/// Incoming item supersedes the existing one when their keys match
///
/// Suited to state snapshots (a newer deployment revision replacing an older
/// one still waiting in the queue).
pub fn replace_by_key<T, K, F>(key: F) -> Aggregator<T>
where
    T: Clone + 'static,
    K: PartialEq + 'static,
    F: Fn(&T) -> K + Send + Sync + 'static,
{
    Arc::new(move |existing: &T, incoming: &T| {
        (key(existing) == key(incoming)).then(|| incoming.clone())
    })
}

/// Incoming item is discarded when equal to the existing one
pub fn dedup<T>() -> Aggregator<T>
where
    T: PartialEq + Clone + 'static,
{
    Arc::new(|existing: &T, incoming: &T| (existing == incoming).then(|| existing.clone()))
}

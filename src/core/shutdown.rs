//! Cooperative Shutdown Signalling
//!
//! Provides the externally owned cancellation signal that blocking queue
//! operations observe. A signal is cheap to clone; every clone observes the
//! same underlying flag, and once triggered it stays triggered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug)]
struct SignalState {
    shutdown_tx: broadcast::Sender<()>,
    shutdown_requested: AtomicBool,
}

/// Waitable "has shutdown been requested" condition
///
/// The queue only ever observes a `ShutdownSignal`: it checks
/// [`is_triggered`](Self::is_triggered) and awaits
/// [`triggered`](Self::triggered), but never triggers or resets it. The
/// creator owns the lifecycle.
///
/// # Example
///
/// ```rust,no_run
/// use eventq::core::shutdown::ShutdownSignal;
///
/// # async fn example() {
/// let shutdown = ShutdownSignal::new();
/// let waiter = shutdown.clone();
///
/// let task = tokio::spawn(async move {
///     waiter.triggered().await;
///     println!("shutting down");
/// });
///
/// shutdown.trigger();
/// task.await.unwrap();
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    state: Arc<SignalState>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Create a new, untriggered signal
    pub fn new() -> Self {
        // Use a larger channel to avoid dropping bursts of shutdown signals
        let (shutdown_tx, _) = broadcast::channel(8);

        Self {
            state: Arc::new(SignalState {
                shutdown_tx,
                shutdown_requested: AtomicBool::new(false),
            }),
        }
    }

    /// Create a signal that is also triggered by process termination signals
    ///
    /// Must be called from within a tokio runtime. A second termination
    /// signal forces an immediate exit.
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        setup_signal_handlers(signal.clone());
        signal
    }

    /// Subscribe to trigger notifications
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.state.shutdown_tx.subscribe()
    }

    /// Trigger the signal, waking every waiter
    pub fn trigger(&self) {
        // Release pairs with the Acquire load in is_triggered()
        if !self.state.shutdown_requested.swap(true, Ordering::Release) {
            log::debug!("Shutdown signal triggered");
        }
        let _ = self.state.shutdown_tx.send(());
    }

    /// Check if the signal has been triggered
    pub fn is_triggered(&self) -> bool {
        self.state.shutdown_requested.load(Ordering::Acquire)
    }

    /// Wait until the signal has been triggered
    ///
    /// Returns immediately if it already has been.
    pub async fn triggered(&self) {
        // Subscribe before checking the flag so a concurrent trigger cannot
        // slip between the check and the wait
        let mut shutdown_rx = self.subscribe();
        if self.is_triggered() {
            return;
        }

        // Lagged still means a trigger was sent; Closed cannot happen while
        // we hold a reference to the sender
        let _ = shutdown_rx.recv().await;
    }
}

/// Set up process signal handlers that trip the given shutdown signal
fn setup_signal_handlers(shutdown: ShutdownSignal) {
    use std::sync::atomic::AtomicUsize;

    let signal_count = Arc::new(AtomicUsize::new(0));

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let signals = [
            SignalKind::interrupt(),
            SignalKind::terminate(),
            SignalKind::hangup(),
            SignalKind::quit(),
        ];

        for kind in signals {
            let shutdown = shutdown.clone();
            let sig_ctr = signal_count.clone();

            tokio::spawn(async move {
                if let Ok(mut sig) = signal(kind) {
                    while sig.recv().await.is_some() {
                        on_termination_signal(&shutdown, &sig_ctr);
                    }
                }
            });
        }
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                on_termination_signal(&shutdown, &signal_count);
            }
        });
    }
}

fn on_termination_signal(shutdown: &ShutdownSignal, signal_count: &std::sync::atomic::AtomicUsize) {
    let prev = signal_count.fetch_add(1, Ordering::AcqRel);
    shutdown.trigger();
    if prev >= 1 {
        log::warn!("Second termination signal received; exiting");
        std::process::exit(130);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_shutdown_signal_creation() {
        let shutdown = ShutdownSignal::new();

        // Should start untriggered
        assert!(!shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_shutdown_signal_trigger() {
        let shutdown = ShutdownSignal::new();
        let mut rx = shutdown.subscribe();

        shutdown.trigger();

        assert!(shutdown.is_triggered());

        let signal_received = timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(signal_received.is_ok(), "Should receive shutdown signal");
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let shutdown = ShutdownSignal::new();
        let observer = shutdown.clone();

        shutdown.trigger();

        assert!(observer.is_triggered());
    }

    #[tokio::test]
    async fn test_triggered_returns_immediately_when_already_triggered() {
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let result = timeout(Duration::from_millis(100), shutdown.triggered()).await;
        assert!(result.is_ok(), "Already-triggered signal should not block");
    }

    #[tokio::test]
    async fn test_triggered_wakes_blocked_waiters() {
        let shutdown = ShutdownSignal::new();

        let mut waiters = Vec::new();
        for _ in 0..3 {
            let waiter = shutdown.clone();
            waiters.push(tokio::spawn(async move { waiter.triggered().await }));
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.trigger();

        for waiter in waiters {
            let result = timeout(Duration::from_millis(500), waiter).await;
            assert!(result.is_ok(), "Every waiter should observe the trigger");
        }
    }

    #[tokio::test]
    async fn test_trigger_is_idempotent() {
        let shutdown = ShutdownSignal::new();

        shutdown.trigger();
        shutdown.trigger();

        assert!(shutdown.is_triggered());
        let result = timeout(Duration::from_millis(100), shutdown.triggered()).await;
        assert!(result.is_ok());
    }
}

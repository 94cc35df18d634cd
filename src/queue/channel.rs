//! Channel adapter over a pausable queue
//!
//! A [`ChannelQueue`] turns pull-style consumption into a channel: a single
//! pump task blocking-pulls from the inner [`PausableQueue`] and hands each
//! item to the consumer through a single-slot output. The slot applies
//! backpressure to the pump only; producers calling
//! [`push`](ChannelQueue::push) never block.
//!
//! The pump claims the output slot before it pulls, so at most one item is
//! ever out of the queue and not yet read. The consumer reads through a
//! [`QueueReceiver`], which yields `None` as soon as the queue is stopped or
//! the creator's [`ShutdownSignal`] fires, even if an item is still parked in
//! the slot.

use crate::core::shutdown::ShutdownSignal;
use crate::core::sync::handle_mutex_poison;
use crate::queue::base::PushOutcome;
use crate::queue::config::QueueOptions;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::pausable::PausableQueue;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Capacity of the output slot between pump and consumer
const OUTPUT_CAPACITY: usize = 1;

/// Pausable, aggregating queue consumed through a channel
///
/// # Example
///
/// ```rust,no_run
/// use eventq::core::shutdown::ShutdownSignal;
/// use eventq::queue::api::{ChannelQueue, QueueOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let shutdown = ShutdownSignal::new();
/// let queue = ChannelQueue::with_options(QueueOptions::new().name("flows"), shutdown.clone());
///
/// let mut output = queue.pull()?;
/// queue.start()?;
///
/// queue.push("flow 10.0.0.1 -> 10.0.0.2".to_string());
/// while let Some(flow) = output.recv().await {
///     println!("processing {}", flow);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ChannelQueue<T> {
    queue: Arc<PausableQueue<T>>,
    shutdown: ShutdownSignal,
    sender: Mutex<Option<mpsc::Sender<T>>>,
    receiver: Mutex<Option<mpsc::Receiver<T>>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> ChannelQueue<T> {
    /// Wrap an already configured queue
    ///
    /// `shutdown` is owned by the caller; the pump only observes it.
    pub fn new(queue: PausableQueue<T>, shutdown: ShutdownSignal) -> Self {
        let (sender, receiver) = mpsc::channel(OUTPUT_CAPACITY);

        Self {
            queue: Arc::new(queue),
            shutdown,
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            pump: Mutex::new(None),
        }
    }

    /// Build the inner queue from options and wrap it
    pub fn with_options(options: QueueOptions<T>, shutdown: ShutdownSignal) -> Self {
        Self::new(PausableQueue::with_options(options), shutdown)
    }

    pub fn name(&self) -> &str {
        self.queue.name()
    }

    /// The wrapped queue, for inspection
    pub fn queue(&self) -> &PausableQueue<T> {
        &self.queue
    }

    /// Resume the queue and launch the pump task
    ///
    /// Must be called from within a tokio runtime. Fails if the adapter was
    /// already started or has been stopped.
    pub fn start(&self) -> QueueResult<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| QueueError::NoRuntime {
            queue: self.name().to_string(),
        })?;

        if self.queue.is_stopped() {
            return Err(QueueError::Stopped {
                queue: self.name().to_string(),
            });
        }

        let sender = lock(&self.sender)?
            .take()
            .ok_or_else(|| QueueError::AlreadyStarted {
                queue: self.name().to_string(),
            })?;

        self.queue.resume();
        let handle = runtime.spawn(pump(
            Arc::clone(&self.queue),
            sender,
            self.shutdown.clone(),
        ));
        *lock(&self.pump)? = Some(handle);

        log::debug!("Queue '{}' started", self.name());
        Ok(())
    }

    /// Push an item into the inner queue; works before and after start
    pub fn push(&self, item: T) -> PushOutcome {
        self.queue.push(item)
    }

    /// Take the output receiver
    ///
    /// There is a single consumer, so the receiver can be taken exactly
    /// once. It yields `None` after the adapter stops.
    pub fn pull(&self) -> QueueResult<QueueReceiver<T>> {
        let receiver = lock(&self.receiver)?
            .take()
            .ok_or_else(|| QueueError::ReceiverTaken {
                queue: self.name().to_string(),
            })?;

        Ok(QueueReceiver {
            receiver,
            queue: Arc::clone(&self.queue),
            shutdown: self.shutdown.clone(),
        })
    }

    pub fn pause(&self) {
        self.queue.pause();
    }

    pub fn resume(&self) {
        self.queue.resume();
    }

    /// Stop the inner queue and close the output
    ///
    /// A running pump exits and drops its sender. An adapter that was never
    /// started still holds the sender, which is dropped here.
    pub fn stop(&self) {
        self.queue.stop();

        match lock(&self.sender) {
            Ok(mut sender) => drop(sender.take()),
            Err(e) => log::warn!("Queue '{}': {}", self.name(), e),
        }
    }

    /// Stop and wait for the pump task to exit
    pub async fn shutdown(&self) -> QueueResult<()> {
        self.stop();

        let handle = lock(&self.pump)?.take();
        if let Some(handle) = handle {
            handle.await.map_err(|e| QueueError::OperationFailed {
                message: format!("pump task for queue '{}' failed: {}", self.name(), e),
            })?;
        }
        Ok(())
    }

    /// Whether the pump task is currently running
    pub fn is_running(&self) -> bool {
        match lock(&self.pump) {
            Ok(pump) => pump.as_ref().is_some_and(|handle| !handle.is_finished()),
            Err(e) => {
                log::warn!("Queue '{}': {}", self.name(), e);
                false
            }
        }
    }
}

fn lock<S>(mutex: &Mutex<S>) -> QueueResult<MutexGuard<'_, S>> {
    handle_mutex_poison(mutex.lock(), |message| QueueError::OperationFailed { message })
}

impl<T> Drop for ChannelQueue<T> {
    fn drop(&mut self) {
        // Release the pump so it does not outlive its adapter
        self.queue.stop();
    }
}

impl<T> fmt::Debug for ChannelQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelQueue")
            .field("queue", &self.queue)
            .field("shutdown", &self.shutdown.is_triggered())
            .finish()
    }
}

/// Consumer end of a [`ChannelQueue`]
pub struct QueueReceiver<T> {
    receiver: mpsc::Receiver<T>,
    queue: Arc<PausableQueue<T>>,
    shutdown: ShutdownSignal,
}

impl<T> QueueReceiver<T> {
    /// Wait for the next item
    ///
    /// Returns `None` once the queue is stopped or the shutdown signal has
    /// fired, including for a read already waiting at that moment. An item
    /// parked in the slot at that point is discarded.
    pub async fn recv(&mut self) -> Option<T> {
        if self.queue.is_stopped() || self.shutdown.is_triggered() {
            return None;
        }

        tokio::select! {
            biased;
            _ = self.queue.stopped() => None,
            _ = self.shutdown.triggered() => None,
            item = self.receiver.recv() => item,
        }
    }
}

impl<T> fmt::Debug for QueueReceiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueReceiver")
            .field("queue", &self.queue.name())
            .field("pending", &self.receiver.len())
            .finish()
    }
}

/// Forward items from the queue to the output until stopped
async fn pump<T: Send + 'static>(
    queue: Arc<PausableQueue<T>>,
    output: mpsc::Sender<T>,
    shutdown: ShutdownSignal,
) {
    log::debug!("Pump for queue '{}' running", queue.name());

    loop {
        // Claim the slot first; an item is only taken once there is room
        let permit = tokio::select! {
            biased;
            _ = queue.stopped() => break,
            _ = shutdown.triggered() => break,
            permit = output.reserve() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    log::debug!("Output receiver for queue '{}' dropped", queue.name());
                    break;
                }
            },
        };

        let item = tokio::select! {
            biased;
            _ = output.closed() => {
                log::debug!("Output receiver for queue '{}' dropped", queue.name());
                break;
            }
            item = queue.pull_blocking(&shutdown) => item,
        };

        match item {
            Some(item) => permit.send(item),
            None => break,
        }
    }

    log::debug!("Pump for queue '{}' exited; closing output", queue.name());
}

//! Bounded multi-consumer queue
//!
//! Tokio's mpsc channel has a single consumer. The pools need several workers
//! pulling from the same queue, so the receiving half is shared behind an
//! async mutex: a worker holds the lock only while waiting for the next item,
//! which hands every item to exactly one worker.
//!
//! Both halves block rather than drop: `send` waits while the queue is full,
//! `recv` waits while it is empty. This is the only flow control in the
//! pipeline.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

/// Capacity used for both the work and the results queue unless configured
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Create a bounded queue holding at most `capacity` items
///
/// A capacity of zero is raised to one.
pub fn bounded<T>(capacity: usize) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    (
        QueueSender { inner: tx },
        QueueReceiver {
            inner: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Returned by [`QueueSender::send`] when every receiver is gone
///
/// Carries the item back to the caller.
#[derive(Debug, PartialEq, Eq)]
pub struct QueueClosed<T>(pub T);

impl<T> fmt::Display for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue closed")
    }
}

impl<T: fmt::Debug> std::error::Error for QueueClosed<T> {}

/// Producing half of a bounded queue
pub struct QueueSender<T> {
    inner: mpsc::Sender<T>,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> QueueSender<T> {
    /// Push an item, waiting for free space if the queue is full
    pub async fn send(&self, item: T) -> Result<(), QueueClosed<T>> {
        self.inner.send(item).await.map_err(|e| QueueClosed(e.0))
    }

    /// Number of items currently waiting in the queue
    pub fn len(&self) -> usize {
        self.inner.max_capacity() - self.inner.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of items the queue holds
    pub fn max_capacity(&self) -> usize {
        self.inner.max_capacity()
    }
}

/// Consuming half of a bounded queue, shareable between workers
pub struct QueueReceiver<T> {
    inner: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for QueueReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> QueueReceiver<T> {
    /// Pull the next item, waiting while the queue is empty
    ///
    /// Returns `None` once every sender is dropped and the queue is drained.
    pub async fn recv(&self) -> Option<T> {
        let mut rx = self.inner.lock().await;
        rx.recv().await
    }
}

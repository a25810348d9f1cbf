use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};

/// Producer half of the job queue
///
/// Sending fails, handing the item back, once every receiver is gone.
pub enum JobSender<T> {
    Bounded(mpsc::Sender<T>),
    Unbounded(mpsc::UnboundedSender<T>),
}

enum Inner<T> {
    Bounded(mpsc::Receiver<T>),
    Unbounded(mpsc::UnboundedReceiver<T>),
}

/// Consumer half of the job queue, shared by a fixed group of workers
pub struct JobReceiver<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

/// Result of one bounded wait on the queue
#[derive(Debug, PartialEq, Eq)]
pub enum Recv<T> {
    Item(T),
    /// Nothing arrived within the wait
    Idle,
    /// The sender is gone and the queue is drained
    Closed,
}

/// Create a job queue; `capacity == 0` means unbounded
pub fn job_queue<T>(capacity: usize) -> (JobSender<T>, JobReceiver<T>) {
    let (sender, inner) = if capacity == 0 {
        let (tx, rx) = mpsc::unbounded_channel();
        (JobSender::Unbounded(tx), Inner::Unbounded(rx))
    } else {
        let (tx, rx) = mpsc::channel(capacity);
        (JobSender::Bounded(tx), Inner::Bounded(rx))
    };

    (
        sender,
        JobReceiver {
            inner: Arc::new(Mutex::new(inner)),
        },
    )
}

impl<T> JobSender<T> {
    /// Enqueue from a blocking thread, waiting for capacity when bounded
    ///
    /// Must not be called from within an async task.
    pub fn blocking_send(&self, item: T) -> Result<(), T> {
        match self {
            Self::Bounded(tx) => tx.blocking_send(item).map_err(|e| e.0),
            Self::Unbounded(tx) => tx.send(item).map_err(|e| e.0),
        }
    }

    /// Enqueue from async code, waiting for capacity when bounded
    pub async fn send(&self, item: T) -> Result<(), T> {
        match self {
            Self::Bounded(tx) => tx.send(item).await.map_err(|e| e.0),
            Self::Unbounded(tx) => tx.send(item).map_err(|e| e.0),
        }
    }
}

impl<T> JobReceiver<T> {
    /// Wait at most `wait` for the next item
    pub async fn recv_timeout(&self, wait: Duration) -> Recv<T> {
        let next = tokio::time::timeout(wait, async {
            let mut inner = self.inner.lock().await;
            match &mut *inner {
                Inner::Bounded(rx) => rx.recv().await,
                Inner::Unbounded(rx) => rx.recv().await,
            }
        })
        .await;

        match next {
            Ok(Some(item)) => Recv::Item(item),
            Ok(None) => Recv::Closed,
            Err(_) => Recv::Idle,
        }
    }
}

impl<T> Clone for JobReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

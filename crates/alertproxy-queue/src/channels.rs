use std::time::Duration;

use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::Mutex as AsyncMutex;

use alertproxy_types::Priority;

use crate::config::QueueConfig;
use crate::job::Job;

struct Lane {
    tx: Sender<Job>,
    rx: AsyncMutex<Receiver<Job>>,
    capacity: usize,
}

impl Lane {
    fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: AsyncMutex::new(rx),
            capacity,
        }
    }

    fn try_send(&self, job: Job) -> Result<(), TrySendError<Job>> {
        self.tx.try_send(job)
    }

    /// Depth of the lane, derived from remaining sender capacity: no `len()`
    /// call needed, and correct regardless of how many receiver-side locks
    /// are momentarily held.
    fn depth(&self) -> usize {
        self.capacity.saturating_sub(self.tx.capacity())
    }

    async fn try_recv(&self) -> Result<Job, TryRecvError> {
        self.rx.lock().await.try_recv()
    }

    async fn recv_timeout(&self, timeout: Duration) -> Option<Job> {
        let mut rx = self.rx.lock().await;
        tokio::time::timeout(timeout, rx.recv()).await.ok().flatten()
    }

    async fn close(&self) {
        self.rx.lock().await.close();
    }

    async fn is_drained(&self) -> bool {
        matches!(self.try_recv().await, Err(TryRecvError::Disconnected))
    }
}

/// The three bounded priority lanes a [`crate::PublishingQueue`] submits
/// into and its workers drain from.
pub(crate) struct Channels {
    high: Lane,
    medium: Lane,
    low: Lane,
}

pub(crate) enum Dequeued {
    Job(Priority, Job),
    /// Nothing available within the idle window; caller should re-poll.
    Idle,
    /// Every lane is closed and empty: no more work will ever arrive.
    Drained,
}

impl Channels {
    pub(crate) fn new(config: &QueueConfig) -> Self {
        Self {
            high: Lane::new(config.high_capacity),
            medium: Lane::new(config.medium_capacity),
            low: Lane::new(config.low_capacity),
        }
    }

    pub(crate) fn try_submit(&self, priority: Priority, job: Job) -> Result<(), TrySendError<Job>> {
        match priority {
            Priority::High => self.high.try_send(job),
            Priority::Medium => self.medium.try_send(job),
            Priority::Low => self.low.try_send(job),
        }
    }

    pub(crate) fn depth(&self, priority: Priority) -> usize {
        match priority {
            Priority::High => self.high.depth(),
            Priority::Medium => self.medium.depth(),
            Priority::Low => self.low.depth(),
        }
    }

    pub(crate) fn capacity(&self, priority: Priority) -> usize {
        match priority {
            Priority::High => self.high.capacity,
            Priority::Medium => self.medium.capacity,
            Priority::Low => self.low.capacity,
        }
    }

    /// Strict descending-priority poll: a non-blocking look at `high`, then
    /// `medium`, then a bounded wait on `low`. The bound is not a shutdown
    /// mechanism — it exists so a worker parked on an empty `low` lane still
    /// returns to the top of the loop often enough to notice a job that
    /// just landed in `high` or `medium`.
    pub(crate) async fn dequeue(&self, idle_timeout: Duration) -> Dequeued {
        if let Ok(job) = self.high.try_recv().await {
            return Dequeued::Job(Priority::High, job);
        }
        if let Ok(job) = self.medium.try_recv().await {
            return Dequeued::Job(Priority::Medium, job);
        }

        match self.low.recv_timeout(idle_timeout).await {
            Some(job) => Dequeued::Job(Priority::Low, job),
            None if self.all_drained().await => Dequeued::Drained,
            None => Dequeued::Idle,
        }
    }

    pub(crate) async fn close(&self) {
        self.high.close().await;
        self.medium.close().await;
        self.low.close().await;
    }

    async fn all_drained(&self) -> bool {
        self.high.is_drained().await && self.medium.is_drained().await && self.low.is_drained().await
    }
}

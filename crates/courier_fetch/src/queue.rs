//! Admission control for in-flight network operations.
//!
//! The queue is a fair Tokio [`Semaphore`]: waiters are admitted strictly in
//! arrival order as running tasks release their slots. Depth is unbounded, so
//! backpressure shows up as latency and never as rejection. Only
//! [`AdmissionQueue::close`] turns waiters away.

use courier_error::{FetchError, FetchResult};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tracing::{debug, trace};

/// Bounds the number of simultaneously executing tasks.
///
/// # Example
///
/// ```rust,ignore
/// let queue = AdmissionQueue::new(3);
/// let body = queue.submit(async { relay.send(request).await }).await??;
/// ```
#[derive(Debug)]
pub struct AdmissionQueue {
    semaphore: Semaphore,
    max_concurrent: usize,
    active: AtomicUsize,
    waiting: AtomicUsize,
}

impl AdmissionQueue {
    /// Create a queue admitting at most `max_concurrent` tasks (at least one).
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Semaphore::new(max_concurrent),
            max_concurrent,
            active: AtomicUsize::new(0),
            waiting: AtomicUsize::new(0),
        }
    }

    /// Run `task` once a slot is free and return its output.
    ///
    /// The slot is held until the task completes or its future is dropped.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` without running `task` if the queue is closed
    /// before a slot frees up.
    pub async fn submit<F>(&self, task: F) -> FetchResult<F::Output>
    where
        F: Future,
    {
        let _permit = {
            let _waiting = Counted::enter(&self.waiting);
            self.semaphore.acquire().await.map_err(|_| {
                debug!("Admission queue closed, rejecting task");
                FetchError::cancelled()
            })?
        };
        let _active = Counted::enter(&self.active);
        trace!(
            active = self.active(),
            waiting = self.waiting(),
            "Admitted task"
        );

        Ok(task.await)
    }

    /// Stop admitting tasks.
    ///
    /// Waiting and later submissions fail with `Cancelled`; admitted tasks
    /// run to completion.
    pub fn close(&self) {
        debug!(waiting = self.waiting(), "Closing admission queue");
        self.semaphore.close();
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Tasks currently holding a slot.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Tasks waiting for a slot.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Maximum simultaneously admitted tasks.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

/// Increments a counter for as long as it lives.
struct Counted<'a>(&'a AtomicUsize);

impl<'a> Counted<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Counted<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

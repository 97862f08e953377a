//! Scheduler for spreading crawl tasks over time
//!
//! This module handles:
//! - Deferring each submitted task by its own random delay
//! - Optionally capping how many tasks run at once via a semaphore
//! - Tracking pending tasks so a run can wait until everything has drained
//!
//! Delays are drawn independently per task. There is no shared queue and no
//! ordering between tasks; the random spread keeps the expected request rate
//! low without coordinating a global budget. Tasks may still coincide by chance.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

/// How long a submitted task waits before it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayPolicy {
    /// Uniformly random delay in `[min, min + window)`
    Spread { min: Duration, window: Duration },

    /// Run as soon as the runtime polls the task
    Immediate,
}

impl DelayPolicy {
    /// The policy described by the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        DelayPolicy::Spread {
            min: Duration::from_millis(config.min_delay_ms),
            window: Duration::from_millis(config.spread_window_ms),
        }
    }

    /// Draws the delay for one task
    pub fn next_delay(&self) -> Duration {
        match *self {
            DelayPolicy::Spread { min, window } => {
                let window_ms = window.as_millis() as u64;
                if window_ms == 0 {
                    return min;
                }
                let offset = rand::thread_rng().gen_range(0..window_ms);
                min + Duration::from_millis(offset)
            }
            DelayPolicy::Immediate => Duration::ZERO,
        }
    }
}

struct Inner {
    policy: DelayPolicy,
    limiter: Option<Arc<Semaphore>>,
    pending: AtomicUsize,
    idle: Notify,
}

/// Decrements the pending count when a task finishes, even by panicking
struct PendingGuard(Arc<Inner>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.0.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Deferred task dispatcher
///
/// Cloning a scheduler yields a handle onto the same pending set, so tasks
/// can schedule follow-up tasks that [`Scheduler::wait_idle`] also waits for.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `policy` - How long each task is deferred
    /// * `max_in_flight` - Cap on tasks running at the same time, if any
    pub fn new(policy: DelayPolicy, max_in_flight: Option<usize>) -> Self {
        Self {
            inner: Arc::new(Inner {
                policy,
                limiter: max_in_flight.map(|limit| Arc::new(Semaphore::new(limit))),
                pending: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Creates a scheduler from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            DelayPolicy::from_config(config),
            config.max_in_flight.map(|limit| limit as usize),
        )
    }

    /// Submits `task` to run after a delay drawn from the policy
    ///
    /// Must be called from within a tokio runtime. The task is counted as
    /// pending from this call until it completes.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.inner.policy.next_delay();
        self.inner.pending.fetch_add(1, Ordering::AcqRel);
        let guard = PendingGuard(Arc::clone(&self.inner));

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            // A closed semaphore only happens on shutdown; run unthrottled then
            let _permit = match &guard.0.limiter {
                Some(limiter) => Arc::clone(limiter).acquire_owned().await.ok(),
                None => None,
            };

            task.await;
        });
    }

    /// Number of tasks submitted but not yet finished
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Returns whether no task is pending
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Waits until every scheduled task, including ones scheduled by other
    /// tasks while waiting, has finished
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

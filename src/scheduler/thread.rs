//! Dedicated-thread scheduler.
//!
//! Work is pushed onto a mutex-protected deque and executed by a single
//! named worker thread, so submission order is execution order. The
//! submitting thread never runs the work itself.

use super::{Scheduler, Work};
use crate::error::BuildError;
use crate::tracing_compat::{debug, warn};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Default name for the worker thread.
pub const DEFAULT_THREAD_NAME: &str = "thenable-scheduler";

struct Shared {
    queue: Mutex<QueueState>,
    ready: Condvar,
}

struct QueueState {
    work: VecDeque<Work>,
    shutdown: bool,
}

/// A scheduler backed by one worker thread.
///
/// Dropping the scheduler (or calling [`shutdown`](Self::shutdown)) lets the
/// worker finish everything already submitted, then joins it.
pub struct ThreadScheduler {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
    name: String,
}

impl ThreadScheduler {
    /// Spawns a scheduler thread named [`DEFAULT_THREAD_NAME`].
    pub fn new() -> Result<Self, BuildError> {
        Self::with_name(DEFAULT_THREAD_NAME)
    }

    /// Spawns a scheduler thread with the given name.
    pub fn with_name(name: impl Into<String>) -> Result<Self, BuildError> {
        let name = name.into();
        let shared = Arc::new(Shared {
            queue: Mutex::new(QueueState {
                work: VecDeque::new(),
                shutdown: false,
            }),
            ready: Condvar::new(),
        });
        let worker = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker_loop(&worker))?;
        debug!(thread = %name, "scheduler thread started");
        Ok(Self {
            shared,
            handle: Mutex::new(Some(handle)),
            name,
        })
    }

    /// Returns the worker thread's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of submitted items not yet started.
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().work.len()
    }

    /// Returns true once shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shared.queue.lock().shutdown
    }

    /// Stops accepting work, drains what was already submitted, and joins
    /// the worker.
    ///
    /// Calling this from the worker thread itself only requests shutdown;
    /// the join is skipped.
    pub fn shutdown(&self) {
        {
            let mut queue = self.shared.queue.lock();
            if queue.shutdown {
                return;
            }
            queue.shutdown = true;
        }
        self.shared.ready.notify_all();

        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        if handle.thread().id() == std::thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            warn!(thread = %self.name, "scheduler thread terminated abnormally");
        }
        debug!(thread = %self.name, "scheduler thread stopped");
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&self, work: Work) {
        {
            let mut queue = self.shared.queue.lock();
            if queue.shutdown {
                warn!(thread = %self.name, "work submitted after shutdown dropped");
                return;
            }
            queue.work.push_back(work);
        }
        self.shared.ready.notify_one();
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for ThreadScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadScheduler")
            .field("name", &self.name)
            .field("pending", &self.pending())
            .finish()
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let next = {
            let mut queue = shared.queue.lock();
            loop {
                if let Some(work) = queue.work.pop_front() {
                    break Some(work);
                }
                if queue.shutdown {
                    break None;
                }
                shared.ready.wait(&mut queue);
            }
        };
        let Some(work) = next else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(work)).is_err() {
            warn!("scheduled work panicked; scheduler thread continues");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn runs_work_in_submission_order() {
        let scheduler = ThreadScheduler::new().expect("spawn scheduler");
        let (tx, rx) = mpsc::channel();
        for n in 0..20 {
            let tx = tx.clone();
            scheduler.schedule(Box::new(move || tx.send(n).expect("send")));
        }
        let received: Vec<i32> = (0..20)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).expect("recv"))
            .collect();
        assert_eq!(received, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn runs_on_the_named_worker_thread() {
        let scheduler = ThreadScheduler::with_name("chain-worker").expect("spawn scheduler");
        assert_eq!(scheduler.name(), "chain-worker");
        let (tx, rx) = mpsc::channel();
        scheduler.schedule(Box::new(move || {
            let name = std::thread::current().name().map(str::to_string);
            tx.send(name).expect("send");
        }));
        let name = rx.recv_timeout(Duration::from_secs(5)).expect("recv");
        assert_eq!(name.as_deref(), Some("chain-worker"));
    }

    #[test]
    fn shutdown_drains_submitted_work_then_rejects_new_work() {
        let scheduler = ThreadScheduler::new().expect("spawn scheduler");
        let (tx, rx) = mpsc::channel();
        for n in 0..3 {
            let tx = tx.clone();
            scheduler.schedule(Box::new(move || tx.send(n).expect("send")));
        }
        scheduler.shutdown();
        assert!(scheduler.is_shutdown());
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![0, 1, 2]);

        let late = tx.clone();
        scheduler.schedule(Box::new(move || late.send(99).expect("send")));
        assert_eq!(scheduler.pending(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn survives_panicking_work() {
        let scheduler = ThreadScheduler::new().expect("spawn scheduler");
        let (tx, rx) = mpsc::channel();
        scheduler.schedule(Box::new(|| panic!("work exploded")));
        scheduler.schedule(Box::new(move || tx.send(()).expect("send")));
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }
}

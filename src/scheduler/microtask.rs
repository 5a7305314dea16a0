//! Host-driven microtask queue.
//!
//! A lock-free FIFO of pending work. Nothing runs until the host calls one
//! of the drain methods, which makes promise chains fully deterministic in
//! tests. Work scheduled while draining is appended behind the work already
//! queued and runs in the same drain.

use super::{Scheduler, Work};
use crossbeam_queue::SegQueue;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome of a drain call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Number of work items executed.
    pub steps: u64,
    /// Whether the queue was empty when the drain returned.
    pub idle: bool,
}

/// A FIFO microtask queue.
#[derive(Default)]
pub struct MicrotaskQueue {
    inner: SegQueue<Work>,
    executed: AtomicU64,
}

impl MicrotaskQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: SegQueue::new(),
            executed: AtomicU64::new(0),
        }
    }

    /// Returns the number of queued work items.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if no work is queued.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the total number of work items run by this queue.
    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    /// Runs the oldest queued item. Returns `false` if the queue was empty.
    pub fn run_next(&self) -> bool {
        match self.inner.pop() {
            Some(work) => {
                work();
                self.executed.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Runs work until the queue is empty, including work enqueued along
    /// the way.
    pub fn run_until_idle(&self) -> DrainReport {
        let mut steps = 0;
        while self.run_next() {
            steps += 1;
        }
        DrainReport { steps, idle: true }
    }

    /// Like [`run_until_idle`](Self::run_until_idle) but stops after
    /// `max_steps` items.
    ///
    /// A chain that keeps scheduling new work forever (for example a
    /// thenable that re-adopts itself) leaves `idle == false`.
    pub fn run_until_idle_bounded(&self, max_steps: u64) -> DrainReport {
        let mut steps = 0;
        while steps < max_steps {
            if !self.run_next() {
                return DrainReport { steps, idle: true };
            }
            steps += 1;
        }
        DrainReport {
            steps,
            idle: self.is_empty(),
        }
    }
}

impl Scheduler for MicrotaskQueue {
    fn schedule(&self, work: Work) {
        self.inner.push(work);
    }
}

impl fmt::Debug for MicrotaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrotaskQueue")
            .field("len", &self.len())
            .field("executed", &self.executed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) -> Work) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |n: u32| -> Work {
            let sink = Arc::clone(&sink);
            Box::new(move || sink.lock().push(n))
        };
        (log, make)
    }

    #[test]
    fn nothing_runs_until_drained() {
        let queue = MicrotaskQueue::new();
        let (log, work) = recorder();
        queue.schedule(work(1));
        assert_eq!(queue.len(), 1);
        assert!(log.lock().is_empty());

        let report = queue.run_until_idle();
        assert_eq!(report, DrainReport { steps: 1, idle: true });
        assert_eq!(*log.lock(), vec![1]);
        assert!(queue.is_empty());
    }

    #[test]
    fn fifo_order() {
        let queue = MicrotaskQueue::new();
        let (log, work) = recorder();
        for n in 0..5 {
            queue.schedule(work(n));
        }
        queue.run_until_idle();
        assert_eq!(*log.lock(), vec![0, 1, 2, 3, 4]);
        assert_eq!(queue.executed(), 5);
    }

    #[test]
    fn work_scheduled_while_draining_runs_after_queued_work() {
        let queue = Arc::new(MicrotaskQueue::new());
        let (log, work) = recorder();
        let inner_queue = Arc::clone(&queue);
        let late = work(3);
        let first = work(1);
        queue.schedule(Box::new(move || {
            first();
            inner_queue.schedule(late);
        }));
        queue.schedule(work(2));

        let report = queue.run_until_idle();
        assert_eq!(report.steps, 3);
        assert_eq!(*log.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn bounded_drain_stops_at_limit() {
        let queue = MicrotaskQueue::new();
        let (log, work) = recorder();
        for n in 0..4 {
            queue.schedule(work(n));
        }
        let report = queue.run_until_idle_bounded(2);
        assert_eq!(report, DrainReport { steps: 2, idle: false });
        assert_eq!(*log.lock(), vec![0, 1]);

        let report = queue.run_until_idle_bounded(10);
        assert_eq!(report, DrainReport { steps: 2, idle: true });
    }

    #[test]
    fn run_next_on_empty() {
        let queue = MicrotaskQueue::new();
        assert!(!queue.run_next());
        assert_eq!(queue.run_until_idle(), DrainReport { steps: 0, idle: true });
    }

    #[test]
    fn debug_shows_len() {
        let queue = MicrotaskQueue::new();
        let debug = format!("{queue:?}");
        assert!(debug.contains("MicrotaskQueue"));
        assert!(debug.contains("len"));
    }
}

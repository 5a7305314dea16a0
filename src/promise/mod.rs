//! The promise state machine.
//!
//! A [`Promise`] starts pending, settles exactly once, and then never
//! changes. While pending it accumulates reactions (registered through
//! [`Promise::then`]); settling hands every reaction to the scheduler in
//! registration order and forgets them. A reaction registered after
//! settlement is scheduled immediately, so every continuation observes the
//! same "runs later, in order, exactly once" behaviour.
//!
//! # Invariants
//!
//! - State moves only from pending to fulfilled or rejected, once.
//! - The settlement value never changes after it is written.
//! - Each reaction fires exactly once, in registration order.
//! - No continuation runs inside the call that registered it or the call
//!   that settled the source; all of them go through the [`Scheduler`].
//!
//! # Locking
//!
//! The cell is guarded by a `parking_lot::Mutex` so promises can be shared
//! across threads. The lock is never held while user code or the scheduler
//! runs: settlement takes the waiter list out of the cell first and
//! dispatches the snapshot afterwards.

mod resolve;
mod settled;
mod then;

pub use resolve::{Rejecter, Resolver};
pub(crate) use resolve::capabilities;
pub use settled::Settled;
pub use then::Handler;

use crate::error::PromiseError;
use crate::scheduler::Scheduler;
use crate::tracing_compat::{trace, warn};
use crate::value::Value;
use core::fmt;
use parking_lot::Mutex;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PROMISE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a promise, used for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PromiseId(u64);

impl PromiseId {
    fn next() -> Self {
        Self(NEXT_PROMISE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates an identifier for testing purposes.
    #[doc(hidden)]
    #[must_use]
    pub const fn new_for_test(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PromiseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Observable state of a promise.
#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState {
    /// Not yet settled.
    Pending,
    /// Settled with a value.
    Fulfilled(Value),
    /// Settled with a reason.
    Rejected(Value),
}

impl PromiseState {
    /// Returns true while the promise has not settled.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true once the promise has settled either way.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    /// Returns true if the promise was fulfilled.
    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled(_))
    }

    /// Returns true if the promise was rejected.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Returns the state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fulfilled(_) => "fulfilled",
            Self::Rejected(_) => "rejected",
        }
    }
}

impl fmt::Display for PromiseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Fulfilled(value) => write!(f, "fulfilled({value})"),
            Self::Rejected(reason) => write!(f, "rejected({reason})"),
        }
    }
}

#[derive(Clone)]
enum Settlement {
    Fulfilled(Value),
    Rejected(Value),
}

impl Settlement {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Fulfilled(_) => "fulfilled",
            Self::Rejected(_) => "rejected",
        }
    }

    fn to_state(&self) -> PromiseState {
        match self {
            Self::Fulfilled(v) => PromiseState::Fulfilled(v.clone()),
            Self::Rejected(r) => PromiseState::Rejected(r.clone()),
        }
    }
}

/// Continuations attached by one `then` call, plus the promise they settle.
struct Reaction {
    on_fulfilled: Handler,
    on_rejected: Handler,
    derived: Promise,
}

impl Reaction {
    fn run(self, settlement: Settlement) {
        let (handler, input) = match settlement {
            Settlement::Fulfilled(value) => (self.on_fulfilled, value),
            Settlement::Rejected(reason) => (self.on_rejected, reason),
        };
        match guarded(|| handler(input)) {
            Ok(value) => resolve::resolve(&self.derived, value),
            Err(reason) => self.derived.reject(reason),
        }
    }
}

enum Slot {
    Pending(Vec<Reaction>),
    Settled(Settlement),
}

struct Shared {
    id: PromiseId,
    scheduler: Arc<dyn Scheduler>,
    slot: Mutex<Slot>,
}

/// A single-assignment container for a value that may not exist yet.
///
/// `Promise` is a cheap handle; clones refer to the same promise.
#[derive(Clone)]
pub struct Promise {
    shared: Arc<Shared>,
}

impl Promise {
    /// Creates a promise and runs `initializer` synchronously with its
    /// settlement capabilities.
    ///
    /// If the initializer returns `Err` or panics, the promise is rejected
    /// with that reason unless it has already settled. Having resolved it
    /// with a still-pending promise does not count as settled.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use thenable::{MicrotaskQueue, Promise, PromiseState, Value};
    ///
    /// let queue = Arc::new(MicrotaskQueue::new());
    /// let promise = Promise::create_with(queue.clone(), |resolve, _reject| {
    ///     resolve.resolve(5);
    ///     Ok(())
    /// });
    /// assert_eq!(promise.state(), PromiseState::Fulfilled(Value::Int(5)));
    /// ```
    pub fn create_with<F>(scheduler: Arc<dyn Scheduler>, initializer: F) -> Self
    where
        F: FnOnce(Resolver, Rejecter) -> Result<(), Value>,
    {
        let promise = Self::pending(scheduler);
        let (resolve, reject) = resolve::capabilities(&promise);
        if let Err(reason) = guarded(|| initializer(resolve, reject)) {
            // Bypasses the capability guard; `settle` ignores settled promises.
            promise.reject(reason);
        }
        promise
    }

    /// Creates a pending promise with no settlement capabilities handed out.
    pub(crate) fn pending(scheduler: Arc<dyn Scheduler>) -> Self {
        let promise = Self {
            shared: Arc::new(Shared {
                id: PromiseId::next(),
                scheduler,
                slot: Mutex::new(Slot::Pending(Vec::new())),
            }),
        };
        trace!(promise = %promise.id(), "promise created");
        promise
    }

    /// Returns this promise's identifier.
    #[must_use]
    pub fn id(&self) -> PromiseId {
        self.shared.id
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> PromiseState {
        match &*self.shared.slot.lock() {
            Slot::Pending(_) => PromiseState::Pending,
            Slot::Settled(settlement) => settlement.to_state(),
        }
    }

    /// Returns true while the promise has not settled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(&*self.shared.slot.lock(), Slot::Pending(_))
    }

    /// Returns the number of reactions waiting for settlement.
    #[must_use]
    pub fn waiter_count(&self) -> usize {
        match &*self.shared.slot.lock() {
            Slot::Pending(waiters) => waiters.len(),
            Slot::Settled(_) => 0,
        }
    }

    /// Returns the scheduler this promise dispatches reactions through.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.shared.scheduler
    }

    /// Returns true if both handles refer to the same promise.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Settles as fulfilled with an already flattened value.
    pub(crate) fn fulfill(&self, value: Value) {
        self.settle(Settlement::Fulfilled(value));
    }

    /// Settles as rejected. No-op unless pending.
    pub(crate) fn reject(&self, reason: Value) {
        self.settle(Settlement::Rejected(reason));
    }

    fn settle(&self, settlement: Settlement) {
        let waiters = {
            let mut slot = self.shared.slot.lock();
            if matches!(&*slot, Slot::Settled(_)) {
                return;
            }
            match std::mem::replace(&mut *slot, Slot::Settled(settlement.clone())) {
                Slot::Pending(waiters) => waiters,
                Slot::Settled(_) => Vec::new(),
            }
        };
        trace!(
            promise = %self.id(),
            state = settlement.as_str(),
            waiters = waiters.len(),
            "promise settled"
        );
        for reaction in waiters {
            self.dispatch(reaction, settlement.clone());
        }
    }

    /// Appends `reaction` while pending, or schedules it right away.
    fn register(&self, reaction: Reaction) {
        let settlement = {
            let mut slot = self.shared.slot.lock();
            match &mut *slot {
                Slot::Pending(waiters) => {
                    waiters.push(reaction);
                    trace!(
                        promise = %self.id(),
                        waiters = waiters.len(),
                        "reaction queued"
                    );
                    return;
                }
                Slot::Settled(settlement) => settlement.clone(),
            }
        };
        trace!(promise = %self.id(), "reaction scheduled on settled promise");
        self.dispatch(reaction, settlement);
    }

    fn dispatch(&self, reaction: Reaction, settlement: Settlement) {
        self.shared
            .scheduler
            .schedule(Box::new(move || reaction.run(settlement)));
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.shared.slot.lock() {
            Slot::Pending(_) => "pending",
            Slot::Settled(settlement) => settlement.as_str(),
        };
        f.debug_struct("Promise")
            .field("id", &self.id())
            .field("state", &state)
            .finish()
    }
}

/// Runs a user callable, turning a panic into a rejection reason.
fn guarded<T>(f: impl FnOnce() -> Result<T, Value>) -> Result<T, Value> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let err = PromiseError::from_panic_payload(payload.as_ref());
            warn!(error = %err, "user callback panicked; converted to rejection");
            Err(Value::Error(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::MicrotaskQueue;

    fn queue() -> Arc<MicrotaskQueue> {
        Arc::new(MicrotaskQueue::new())
    }

    #[test]
    fn create_runs_initializer_synchronously() {
        let q = queue();
        let mut ran = false;
        let promise = Promise::create_with(q.clone(), |_, _| {
            ran = true;
            Ok(())
        });
        assert!(ran);
        assert!(promise.is_pending());
        assert!(q.is_empty());
    }

    #[test]
    fn initializer_error_rejects() {
        let promise = Promise::create_with(queue(), |_, _| Err(Value::from("init failed")));
        assert_eq!(promise.state(), PromiseState::Rejected("init failed".into()));
    }

    #[test]
    fn initializer_error_after_resolve_is_ignored() {
        let promise = Promise::create_with(queue(), |resolve, _| {
            resolve.resolve(1);
            Err(Value::from("too late"))
        });
        assert_eq!(promise.state(), PromiseState::Fulfilled(Value::Int(1)));
    }

    #[test]
    fn initializer_error_while_adopting_rejects() {
        let q = queue();
        let inner = Promise::pending(q.clone());
        let adopted = inner.clone();
        let promise = Promise::create_with(q.clone(), move |resolve, _| {
            resolve.resolve(adopted);
            Err(Value::from("raised"))
        });
        assert_eq!(promise.state(), PromiseState::Rejected("raised".into()));

        inner.fulfill(Value::Int(1));
        q.run_until_idle();
        assert_eq!(promise.state(), PromiseState::Rejected("raised".into()));
    }

    #[test]
    fn initializer_panic_rejects_with_panic_error() {
        let promise = Promise::create_with(queue(), |_, _| panic!("init exploded"));
        match promise.state() {
            PromiseState::Rejected(Value::Error(err)) => {
                assert_eq!(err, PromiseError::panicked("init exploded"));
            }
            other => unreachable!("expected panic rejection, got {other:?}"),
        }
    }

    #[test]
    fn settle_is_monotonic() {
        let promise = Promise::pending(queue());
        promise.fulfill(Value::Int(1));
        promise.reject(Value::from("nope"));
        promise.fulfill(Value::Int(2));
        assert_eq!(promise.state(), PromiseState::Fulfilled(Value::Int(1)));
    }

    #[test]
    fn reject_then_fulfill_keeps_rejection() {
        let promise = Promise::pending(queue());
        promise.reject(Value::from("first"));
        promise.fulfill(Value::Int(2));
        assert_eq!(promise.state(), PromiseState::Rejected("first".into()));
    }

    #[test]
    fn settlement_drains_waiters_through_scheduler() {
        let q = queue();
        let promise = Promise::pending(q.clone());
        let _a = promise.then(None, None);
        let _b = promise.then(None, None);
        assert_eq!(promise.waiter_count(), 2);
        assert!(q.is_empty());

        promise.fulfill(Value::Int(3));
        assert_eq!(promise.waiter_count(), 0);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn state_predicates_and_display() {
        assert!(PromiseState::Pending.is_pending());
        assert!(!PromiseState::Pending.is_settled());
        let fulfilled = PromiseState::Fulfilled(Value::Int(1));
        assert!(fulfilled.is_settled() && fulfilled.is_fulfilled());
        let rejected = PromiseState::Rejected(Value::from("r"));
        assert!(rejected.is_rejected() && !rejected.is_fulfilled());
        assert_eq!(fulfilled.to_string(), "fulfilled(1)");
        assert_eq!(rejected.as_str(), "rejected");
    }

    #[test]
    fn ids_are_unique_and_displayed() {
        let a = Promise::pending(queue());
        let b = Promise::pending(queue());
        assert_ne!(a.id(), b.id());
        assert_eq!(PromiseId::new_for_test(12).to_string(), "P12");
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn debug_reports_state_label() {
        let promise = Promise::pending(queue());
        assert!(format!("{promise:?}").contains("pending"));
        promise.reject(Value::Null);
        assert!(format!("{promise:?}").contains("rejected"));
    }
}

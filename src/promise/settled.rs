//! Bridge from a promise to `std::future::Future`.

use super::Promise;
use crate::value::Value;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

#[derive(Default)]
struct SettledSlot {
    outcome: Option<Result<Value, Value>>,
    waker: Option<Waker>,
}

/// Future resolving to a promise's outcome.
///
/// Yields `Ok(value)` if the promise fulfills and `Err(reason)` if it
/// rejects. The outcome arrives through an ordinary reaction, so it is
/// only observable after the promise's scheduler has run it.
#[must_use = "futures do nothing unless polled"]
pub struct Settled {
    slot: Arc<Mutex<SettledSlot>>,
}

impl Promise {
    /// Returns a future that completes with this promise's outcome.
    pub fn settled(&self) -> Settled {
        let slot = Arc::new(Mutex::new(SettledSlot::default()));
        let on_value = Arc::clone(&slot);
        let on_reason = Arc::clone(&slot);
        let _ = self.then(
            Some(Box::new(move |value| {
                complete(&on_value, Ok(value));
                Ok(Value::Undefined)
            })),
            Some(Box::new(move |reason| {
                complete(&on_reason, Err(reason));
                Ok(Value::Undefined)
            })),
        );
        Settled { slot }
    }
}

fn complete(slot: &Mutex<SettledSlot>, outcome: Result<Value, Value>) {
    let waker = {
        let mut slot = slot.lock();
        slot.outcome = Some(outcome);
        slot.waker.take()
    };
    if let Some(waker) = waker {
        waker.wake();
    }
}

impl Future for Settled {
    type Output = Result<Value, Value>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.lock();
        if let Some(outcome) = slot.outcome.take() {
            return Poll::Ready(outcome);
        }
        slot.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl std::fmt::Debug for Settled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settled")
            .field("ready", &self.slot.lock().outcome.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::MicrotaskQueue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Wake;

    #[derive(Default)]
    struct WakeCounter {
        wakes: AtomicUsize,
    }

    impl Wake for WakeCounter {
        fn wake(self: Arc<Self>) {
            self.wakes.fetch_add(1, Ordering::Relaxed);
        }

        fn wake_by_ref(self: &Arc<Self>) {
            self.wakes.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn pending_until_reaction_runs_then_ready() {
        let queue = Arc::new(MicrotaskQueue::new());
        let promise = Promise::pending(queue.clone());
        let counter = Arc::new(WakeCounter::default());
        let waker = Waker::from(Arc::clone(&counter));
        let mut cx = Context::from_waker(&waker);
        let mut fut = Box::pin(promise.settled());

        assert!(fut.as_mut().poll(&mut cx).is_pending());
        promise.fulfill(Value::Int(9));
        assert!(fut.as_mut().poll(&mut cx).is_pending());

        queue.run_until_idle();
        assert_eq!(counter.wakes.load(Ordering::Relaxed), 1);
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Ready(Ok(Value::Int(9))));
    }

    #[test]
    fn rejection_yields_err() {
        let queue = Arc::new(MicrotaskQueue::new());
        let promise = Promise::pending(queue.clone());
        promise.reject(Value::from("nope"));
        let counter = Arc::new(WakeCounter::default());
        let waker = Waker::from(Arc::clone(&counter));
        let mut cx = Context::from_waker(&waker);
        let mut fut = Box::pin(promise.settled());

        queue.run_until_idle();
        assert_eq!(counter.wakes.load(Ordering::Relaxed), 0);
        assert_eq!(
            fut.as_mut().poll(&mut cx),
            Poll::Ready(Err(Value::from("nope")))
        );
    }
}

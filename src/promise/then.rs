//! The chaining operator.

use super::{Promise, Reaction};
use crate::value::Value;

/// A continuation passed to [`Promise::then`].
///
/// Returning `Ok(x)` resolves the derived promise with `x` (adopting it if
/// it is future-like); returning `Err(r)` rejects the derived promise with
/// `r`.
pub type Handler = Box<dyn FnOnce(Value) -> Result<Value, Value> + Send + 'static>;

fn pass_through() -> Handler {
    Box::new(Ok::<Value, Value>)
}

// Rethrows; the reaction wrapper catches it and rejects the derived promise.
fn rethrow() -> Handler {
    Box::new(Err::<Value, Value>)
}

impl Promise {
    /// Registers continuations and returns the promise they feed.
    ///
    /// A missing `on_fulfilled` passes the value through; a missing
    /// `on_rejected` rethrows the reason. Neither continuation ever runs
    /// before this call returns.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use thenable::{MicrotaskQueue, Promise, PromiseState, Value};
    ///
    /// let queue = Arc::new(MicrotaskQueue::new());
    /// let five = Promise::create_with(queue.clone(), |resolve, _| {
    ///     resolve.resolve(5);
    ///     Ok(())
    /// });
    /// let six = five.then(
    ///     Some(Box::new(|v| Ok(Value::Int(v.as_int().unwrap_or(0) + 1)))),
    ///     None,
    /// );
    /// assert!(six.is_pending());
    /// queue.run_until_idle();
    /// assert_eq!(six.state(), PromiseState::Fulfilled(Value::Int(6)));
    /// ```
    #[must_use = "the derived promise carries the continuation's outcome"]
    pub fn then(&self, on_fulfilled: Option<Handler>, on_rejected: Option<Handler>) -> Self {
        let derived = Self::pending(self.shared.scheduler.clone());
        self.register(Reaction {
            on_fulfilled: on_fulfilled.unwrap_or_else(pass_through),
            on_rejected: on_rejected.unwrap_or_else(rethrow),
            derived: derived.clone(),
        });
        derived
    }

    /// Shorthand for `then(Some(f), None)`.
    #[must_use = "the derived promise carries the continuation's outcome"]
    pub fn on_fulfilled<F>(&self, f: F) -> Self
    where
        F: FnOnce(Value) -> Result<Value, Value> + Send + 'static,
    {
        self.then(Some(Box::new(f)), None)
    }

    /// Shorthand for `then(None, Some(f))`.
    #[must_use = "the derived promise carries the continuation's outcome"]
    pub fn on_rejected<F>(&self, f: F) -> Self
    where
        F: FnOnce(Value) -> Result<Value, Value> + Send + 'static,
    {
        self.then(None, Some(Box::new(f)))
    }
}

//! The resolution procedure.
//!
//! `resolve(target, x)` settles `target` from an arbitrary value `x`,
//! flattening anything future-like:
//!
//! 1. `x` is `target` itself: reject with [`PromiseError::SelfResolution`].
//! 2. `x` is a [`Promise`]: adopt its eventual outcome.
//! 3. `x` is object-like: probe for `then`. A callable `then` is invoked
//!    with a fresh [`Resolver`]/[`Rejecter`] pair sharing one one-shot guard;
//!    resolving through that pair re-enters this procedure, so thenables
//!    nest to any depth. A failed probe or a failed invocation (before the
//!    guard is claimed) rejects `target`. No callable `then` means `x` is
//!    the fulfillment value.
//! 4. Anything else fulfills `target` directly.

use super::Promise;
use crate::error::PromiseError;
use crate::tracing_compat::{debug, trace};
use crate::value::{Object, Value};
use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One-shot flag shared by a resolve/reject capability pair.
#[derive(Debug, Default)]
pub(crate) struct OnceGuard(AtomicBool);

impl OnceGuard {
    /// Claims the guard. Only the first caller gets `true`.
    pub(crate) fn try_claim(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn is_claimed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Capability that resolves a promise.
///
/// Shares a one-shot guard with its [`Rejecter`]: the first call to either
/// wins and every later call is ignored.
#[derive(Clone)]
pub struct Resolver {
    target: Promise,
    guard: Arc<OnceGuard>,
}

impl Resolver {
    /// Runs the resolution procedure on the target with `value`.
    ///
    /// Ignored if this capability pair was already used.
    pub fn resolve(&self, value: impl Into<Value>) {
        if self.guard.try_claim() {
            resolve(&self.target, value.into());
        } else {
            trace!(promise = %self.target.id(), "resolve ignored; capability already used");
        }
    }

    /// Returns true once this capability pair has been used.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.guard.is_claimed()
    }

    /// Returns the promise this capability settles.
    #[must_use]
    pub fn promise(&self) -> &Promise {
        &self.target
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("promise", &self.target.id())
            .field("used", &self.is_used())
            .finish()
    }
}

/// Capability that rejects a promise.
///
/// Shares a one-shot guard with its [`Resolver`].
#[derive(Clone)]
pub struct Rejecter {
    target: Promise,
    guard: Arc<OnceGuard>,
}

impl Rejecter {
    /// Rejects the target with `reason`.
    ///
    /// Ignored if this capability pair was already used.
    pub fn reject(&self, reason: impl Into<Value>) {
        if self.guard.try_claim() {
            self.target.reject(reason.into());
        } else {
            trace!(promise = %self.target.id(), "reject ignored; capability already used");
        }
    }

    /// Returns true once this capability pair has been used.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.guard.is_claimed()
    }

    /// Returns the promise this capability settles.
    #[must_use]
    pub fn promise(&self) -> &Promise {
        &self.target
    }
}

impl fmt::Debug for Rejecter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejecter")
            .field("promise", &self.target.id())
            .field("used", &self.is_used())
            .finish()
    }
}

/// Creates a fresh capability pair for `target`.
pub(crate) fn capabilities(target: &Promise) -> (Resolver, Rejecter) {
    let guard = Arc::new(OnceGuard::default());
    (
        Resolver {
            target: target.clone(),
            guard: Arc::clone(&guard),
        },
        Rejecter {
            target: target.clone(),
            guard,
        },
    )
}

/// Settles `target` from `x`, adopting `x` if it is future-like.
pub(crate) fn resolve(target: &Promise, x: Value) {
    match x {
        Value::Promise(inner) if inner.ptr_eq(target) => {
            debug!(promise = %target.id(), "promise resolved with itself");
            target.reject(PromiseError::self_resolution(target.id()).into());
        }
        Value::Promise(inner) => adopt_promise(target, &inner),
        Value::Object(object) => adopt_object(target, object),
        plain => target.fulfill(plain),
    }
}

fn adopt_promise(target: &Promise, inner: &Promise) {
    trace!(promise = %target.id(), source = %inner.id(), "adopting promise");
    let on_value = target.clone();
    let on_reason = target.clone();
    let _ = inner.then(
        Some(Box::new(move |value| {
            on_value.fulfill(value);
            Ok(Value::Undefined)
        })),
        Some(Box::new(move |reason| {
            on_reason.reject(reason);
            Ok(Value::Undefined)
        })),
    );
}

fn adopt_object(target: &Promise, object: Object) {
    let then = match super::guarded(|| object.lookup_then()) {
        Ok(Some(then)) => then,
        Ok(None) => {
            target.fulfill(Value::Object(object));
            return;
        }
        Err(reason) => {
            debug!(promise = %target.id(), reason = %reason, "reading then raised");
            target.reject(reason);
            return;
        }
    };

    trace!(promise = %target.id(), "adopting thenable");
    let (resolve_once, reject_once) = capabilities(target);
    let fallback = reject_once.clone();
    if let Err(reason) = super::guarded(|| then(resolve_once, reject_once)) {
        if fallback.is_used() {
            debug!(
                promise = %target.id(),
                reason = %reason,
                "then raised after settling; ignored"
            );
        } else {
            debug!(promise = %target.id(), reason = %reason, "calling then raised");
            fallback.reject(reason);
        }
    }
}

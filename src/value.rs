//! Dynamic values carried by promises.
//!
//! A settled promise holds a [`Value`]: either plain data, an error produced
//! by this crate, another [`Promise`], or a foreign [`Object`]. Foreign
//! objects are the interoperability seam: anything implementing
//! [`HostObject`] can expose a `then` capability and be adopted by the
//! resolution procedure exactly like a native promise.
//!
//! # Probing for `then`
//!
//! Whether a value is future-like is decided by one explicit capability
//! check, [`HostObject::lookup_then`]. It distinguishes three outcomes:
//!
//! | Result            | Meaning                                   |
//! |-------------------|-------------------------------------------|
//! | `Ok(Some(then))`  | the object exposes a callable `then`      |
//! | `Ok(None)`        | `then` is absent or not callable          |
//! | `Err(reason)`     | reading `then` raised `reason`            |

use crate::error::PromiseError;
use crate::promise::{Promise, Rejecter, Resolver};
use core::fmt;
use std::sync::Arc;

/// A `then` method read from a foreign object.
///
/// It is invoked at most once, synchronously, with a fresh
/// resolve/reject pair. Returning `Err` means the invocation raised.
pub type ThenFn = Box<dyn FnOnce(Resolver, Rejecter) -> Result<(), Value>>;

/// A foreign object that may behave like a promise.
pub trait HostObject: fmt::Debug + Send + Sync {
    /// Reads this object's `then` member.
    ///
    /// See the [module documentation](self) for the meaning of each result.
    fn lookup_then(&self) -> Result<Option<ThenFn>, Value>;
}

/// A shared handle to a [`HostObject`].
///
/// Equality is identity: two handles are equal when they point at the same
/// object.
#[derive(Clone)]
pub struct Object(Arc<dyn HostObject>);

impl Object {
    /// Wraps a host object.
    pub fn new<T: HostObject + 'static>(object: T) -> Self {
        Self(Arc::new(object))
    }

    /// Wraps an already shared host object.
    #[must_use]
    pub fn from_arc(object: Arc<dyn HostObject>) -> Self {
        Self(object)
    }

    /// Creates a thenable whose `then` method runs `then`.
    ///
    /// Every lookup yields a callable `then`, so values built this way are
    /// always adopted.
    ///
    /// ```
    /// use thenable::{Object, Value};
    ///
    /// let thenable = Object::thenable(|resolve, _reject| {
    ///     resolve.resolve(1);
    ///     Ok(())
    /// });
    /// assert!(Value::from(thenable).is_object_like());
    /// ```
    pub fn thenable<F>(then: F) -> Self
    where
        F: Fn(Resolver, Rejecter) -> Result<(), Value> + Send + Sync + 'static,
    {
        Self::new(FnThenable {
            then: Arc::new(then),
        })
    }

    /// Performs the `then` capability check on the wrapped object.
    pub fn lookup_then(&self) -> Result<Option<ThenFn>, Value> {
        self.0.lookup_then()
    }

    /// Returns `true` if both handles refer to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Object").field(&self.0).finish()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

type SharedThen = Arc<dyn Fn(Resolver, Rejecter) -> Result<(), Value> + Send + Sync>;

struct FnThenable {
    then: SharedThen,
}

impl fmt::Debug for FnThenable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnThenable").finish_non_exhaustive()
    }
}

impl HostObject for FnThenable {
    fn lookup_then(&self) -> Result<Option<ThenFn>, Value> {
        let then = Arc::clone(&self.then);
        Ok(Some(Box::new(move |resolve, reject| then(resolve, reject))))
    }
}

/// A dynamically typed value: a fulfillment value or a rejection reason.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value.
    #[default]
    Undefined,
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A string.
    Str(String),
    /// An error raised by the promise machinery.
    Error(PromiseError),
    /// A promise from this crate.
    Promise(Promise),
    /// A foreign object, possibly thenable.
    Object(Object),
}

impl Value {
    /// Returns `true` for values the resolution procedure must probe for a
    /// `then` capability.
    #[must_use]
    pub const fn is_object_like(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Returns `true` for [`Value::Undefined`].
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns the integer, if this is an `Int`.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a `Str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the error, if this is an `Error`.
    #[must_use]
    pub const fn as_error(&self) -> Option<&PromiseError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the promise, if this is a `Promise`.
    #[must_use]
    pub const fn as_promise(&self) -> Option<&Promise> {
        match self {
            Self::Promise(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the object, if this is an `Object`.
    #[must_use]
    pub const fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            #[allow(clippy::float_cmp)]
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Error(a), Self::Error(b)) => a == b,
            (Self::Promise(a), Self::Promise(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::Error(err) => write!(f, "{err}"),
            Self::Promise(p) => write!(f, "[promise {}]", p.id()),
            Self::Object(_) => f.write_str("[object]"),
        }
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Undefined
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<PromiseError> for Value {
    fn from(err: PromiseError) -> Self {
        Self::Error(err)
    }
}

impl From<Promise> for Value {
    fn from(p: Promise) -> Self {
        Self::Promise(p)
    }
}

impl From<&Promise> for Value {
    fn from(p: &Promise) -> Self {
        Self::Promise(p.clone())
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Self::Object(o)
    }
}

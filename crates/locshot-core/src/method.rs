//! Method identifiers, implementations, and the call context handed to them.

use std::fmt;
use std::sync::Arc;

use crate::intercept::InterceptionEngine;
use crate::object::{Object, Value};

/// Symbolic name of an operation, independent of what currently backs it.
///
/// Cheap to clone; equality and hashing are by name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(Arc<str>);

impl MethodId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodId({})", self.0)
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MethodId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Everything an implementation sees when it is invoked.
///
/// Interceptors usually forward the same `Call` to the original
/// implementation they captured, or use [`Call::engine`] to dispatch other
/// messages to the receiver.
#[derive(Clone, Copy)]
pub struct Call<'a> {
    engine: &'a InterceptionEngine,
    receiver: &'a Object,
    method: &'a MethodId,
    args: &'a [Value],
}

impl<'a> Call<'a> {
    pub fn new(
        engine: &'a InterceptionEngine,
        receiver: &'a Object,
        method: &'a MethodId,
        args: &'a [Value],
    ) -> Self {
        Self {
            engine,
            receiver,
            method,
            args,
        }
    }

    pub fn engine(&self) -> &'a InterceptionEngine {
        self.engine
    }

    pub fn receiver(&self) -> &'a Object {
        self.receiver
    }

    pub fn method(&self) -> &'a MethodId {
        self.method
    }

    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    /// Argument at `index`, or `Value::Nil` when absent.
    pub fn arg(&self, index: usize) -> &'a Value {
        self.args.get(index).unwrap_or(&Value::Nil)
    }

    /// Same receiver and method with a different argument list.
    #[must_use]
    pub fn with_args(&self, args: &'a [Value]) -> Self {
        Self { args, ..*self }
    }
}

type ImpFn = dyn Fn(&Call<'_>) -> Value + Send + Sync;

/// A callable method body. Clones share the same function.
#[derive(Clone)]
pub struct Implementation {
    func: Arc<ImpFn>,
    label: Arc<str>,
}

impl Implementation {
    /// Wrap a closure. `label` only shows up in logs and `Debug` output.
    pub fn new<F>(label: impl AsRef<str>, func: F) -> Self
    where
        F: Fn(&Call<'_>) -> Value + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            label: Arc::from(label.as_ref()),
        }
    }

    /// An implementation that ignores its arguments and returns `value`.
    pub fn constant(label: impl AsRef<str>, value: Value) -> Self {
        Self::new(label, move |_| value.clone())
    }

    #[inline]
    pub fn call(&self, call: &Call<'_>) -> Value {
        (self.func)(call)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// True when both handles share the same underlying function.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Implementation").field(&self.label).finish()
    }
}

//! # Invocation record.
//!
//! [`CallRecord`] captures one invocation of a task's user code: the target it
//! belongs to, the positional and keyword arguments, and the callable itself.
//! It is immutable once built and is dropped when the invocation returns.
//!
//! ## Example
//! ```rust
//! use runvisor::{CallRecord, Kwargs};
//!
//! let mut kwargs = Kwargs::new();
//! kwargs.insert("x".to_string(), 3);
//!
//! let call = CallRecord::new("sum", vec![1, 2], kwargs, |args: &[i64], kw: &Kwargs<i64>| {
//!     args.iter().sum::<i64>() + kw.values().sum::<i64>()
//! });
//!
//! assert_eq!(call.invoke(), 6);
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::calls::CallState;

/// Keyword arguments: unique names mapped to values.
pub type Kwargs<V> = BTreeMap<String, V>;

/// One invocation of a callable with a fixed set of arguments.
#[derive(Clone, Debug)]
pub struct CallRecord<V, F> {
    target: Cow<'static, str>,
    args: Vec<V>,
    kwargs: Kwargs<V>,
    callable: F,
}

impl<V, F> CallRecord<V, F> {
    /// Creates a record for `target`.
    pub fn new(
        target: impl Into<Cow<'static, str>>,
        args: Vec<V>,
        kwargs: Kwargs<V>,
        callable: F,
    ) -> Self {
        Self {
            target: target.into(),
            args,
            kwargs,
            callable,
        }
    }

    /// Name of the task the callable belongs to.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Positional arguments, in call order.
    pub fn args(&self) -> &[V] {
        &self.args
    }

    /// Keyword arguments.
    pub fn kwargs(&self) -> &Kwargs<V> {
        &self.kwargs
    }

    /// The underlying callable.
    pub fn callable(&self) -> &F {
        &self.callable
    }

    /// Calls the callable with the recorded arguments.
    ///
    /// Returns exactly what the callable returns. Errors and panics are not
    /// wrapped or caught.
    pub fn invoke<R>(&self) -> R
    where
        F: Fn(&[V], &Kwargs<V>) -> R,
    {
        (self.callable)(&self.args, &self.kwargs)
    }

    /// Calls the callable between [`CallState::start`] and [`CallState::finish`].
    ///
    /// ### Rules
    /// - `Ok(v)` finishes with `Some(v)` (cloned only if the state retains results)
    /// - `Err(e)` finishes with `None`
    /// - the callable's `Result` is returned unchanged
    /// - a panic unwinds before `finish`, leaving the attempt unfinished
    pub fn invoke_tracked<T, E>(&self, state: &mut CallState<T>) -> Result<T, E>
    where
        F: Fn(&[V], &Kwargs<V>) -> Result<T, E>,
        T: Clone,
    {
        state.start();
        let res = self.invoke();
        match &res {
            Ok(v) if state.should_store_result() => state.finish(Some(v.clone())),
            _ => state.finish(None),
        }
        res
    }
}

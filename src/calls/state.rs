//! # Per-attempt invocation state.
//!
//! [`CallState`] tracks one invocation attempt: `Idle → Started → Finished`.
//! A new [`start`](CallState::start) re-enters `Started` and clears whatever the
//! previous attempt left behind.
//!
//! ## Rules
//! - `finished` implies `started`
//! - `result_saved` implies `should_store_result` and `finished`
//! - results are retained only when the state was created with `should_store_result`
//! - failures are not modelled: callers call `finish(None)` on failure paths

/// State of a single invocation attempt.
///
/// # Example
/// ```
/// use runvisor::CallState;
///
/// let mut state = CallState::new(true);
/// state.start();
/// state.finish(Some(42));
///
/// assert!(state.is_finished());
/// assert!(state.is_result_saved());
/// assert_eq!(state.result(), Some(&42));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallState<T> {
    started: bool,
    finished: bool,
    result_saved: bool,
    result: Option<T>,
    should_store_result: bool,
}

impl<T> CallState<T> {
    /// Creates an idle state. `should_store_result` is fixed for the lifetime of the state.
    pub fn new(should_store_result: bool) -> Self {
        Self {
            started: false,
            finished: false,
            result_saved: false,
            result: None,
            should_store_result,
        }
    }

    /// Marks the attempt as started and clears any previous outcome.
    pub fn start(&mut self) {
        self.started = true;
        self.finished = false;
        self.result_saved = false;
        self.result = None;
    }

    /// Marks the attempt as concluded.
    ///
    /// The result is kept only if the state was created with `should_store_result`;
    /// otherwise it is dropped here.
    pub fn finish(&mut self, result: Option<T>) {
        self.finished = true;
        if self.should_store_result {
            self.result_saved = true;
            self.result = result;
        }
    }

    /// `true` once [`start`](Self::start) has been called at least once.
    #[inline]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// `true` if the most recent attempt has concluded.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// `true` if a finished attempt had its result retained.
    #[inline]
    pub fn is_result_saved(&self) -> bool {
        self.result_saved
    }

    /// Retention policy given at construction.
    #[inline]
    pub fn should_store_result(&self) -> bool {
        self.should_store_result
    }

    /// Retained result of the last attempt, if any.
    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    /// Moves the retained result out, leaving `None`.
    pub fn take_result(&mut self) -> Option<T> {
        self.result.take()
    }
}

impl<T> Default for CallState<T> {
    fn default() -> Self {
        Self::new(false)
    }
}

//! # Task invocation records and per-attempt state.
//!
//! This module provides the driver-side invocation types:
//! - [`CallRecord`] - immutable description of one invocation (target, args, callable)
//! - [`CallState`] - per-attempt state machine deciding whether the result is retained
//!
//! ## Lifecycle
//! ```text
//! CallState::new(store?) ──► start() ──► CallRecord::invoke() ──► finish(result)
//!                               ▲                                      │
//!                               └──────────── retry (same state) ──────┘
//! ```

mod record;
mod state;

pub use record::{CallRecord, Kwargs};
pub use state::CallState;

//! # runvisor
//!
//! **runvisor** covers two pieces of an orchestration driver's run:
//! tracking each task invocation from dispatch to completion, and keeping an
//! out-of-process heartbeat alive for exactly as long as the driver is.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  Driver process                                   Heartbeat process
//! ┌────────────────────────────────────────┐      ┌──────────────────────────────┐
//! │ HeartbeatSupervisor::acquire(cfg)      │spawn │ runvisor send-heartbeat ...  │
//! │   └─► SupervisorHandle ───────────────────────►   HeartbeatLoop::run()       │
//! │                                        │      │     ├─ DriverProbe (getpgid) │
//! │ per invocation:                        │      │     ├─ TrackingStore         │
//! │   CallState::start()                   │      │     │    .heartbeat(run_id)  │
//! │   CallRecord::invoke()                 │      │     └─ sleep_until(start+i)  │
//! │   CallState::finish(result)            │      │                              │
//! │                                        │      │                              │
//! │ scope exit ─► SupervisorHandle::drop ──SIGTERM──►   exit 0                   │
//! └────────────────────────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! The two sides share no memory: the child only knows the driver's pid and the
//! tracking endpoint. It stops on its own when the driver's process group
//! disappears, and the driver stops it when the run scope ends.
//!
//! ### Failure isolation
//! - invocation failures propagate unchanged to the caller of [`CallRecord::invoke`]
//! - heartbeat failures (spawn, store, termination) are logged and never reach the driver
//!
//! ## Features
//! | Area             | Description                                             | Key types                                   |
//! |------------------|---------------------------------------------------------|---------------------------------------------|
//! | **Invocations**  | Invocation record and per-attempt result retention.     | [`CallRecord`], [`CallState`]               |
//! | **Supervision**  | Scoped spawn/teardown of the heartbeat process.         | [`HeartbeatSupervisor`], [`SupervisorHandle`] |
//! | **Heartbeat**    | Drift-corrected liveness loop.                          | [`HeartbeatLoop`], [`DriverProbe`]          |
//! | **Tracking**     | Stores that receive heartbeats.                         | [`TrackingStore`], [`TrackingFn`]           |
//! | **Errors**       | Typed errors for stores, probes and the supervisor.     | [`TrackingError`], [`SupervisorError`]      |
//! | **Configuration**| Per-run heartbeat settings.                             | [`HeartbeatConfig`]                         |
//!
//! ## Optional features
//! - `web` _(default)_: HTTP tracking store (`WebTrackingStore`).
//!
//! ## Example
//! ```rust
//! use runvisor::{CallRecord, CallState, HeartbeatConfig, HeartbeatSupervisor, Kwargs};
//!
//! // Disabled heartbeat: no process is spawned.
//! let cfg = HeartbeatConfig::new("run-1").with_interval_s(0);
//! let _heartbeat = HeartbeatSupervisor::os().acquire(&cfg);
//!
//! let call = CallRecord::new("double", vec![21], Kwargs::new(), |args: &[i64], _: &Kwargs<i64>| {
//!     Ok::<_, String>(args[0] * 2)
//! });
//! let mut state = CallState::new(true);
//!
//! assert_eq!(call.invoke_tracked(&mut state), Ok(42));
//! assert!(state.is_finished());
//! assert_eq!(state.result(), Some(&42));
//! ```

mod calls;
pub mod cli;
mod config;
mod error;
mod heartbeat;
mod supervisor;

// ---- Public re-exports ----

pub use calls::{CallRecord, CallState, Kwargs};
pub use config::{DEFAULT_INTERVAL_S, DEFAULT_PROGRAM, HeartbeatConfig};
pub use error::{ProbeError, SupervisorError, TrackingError};
pub use heartbeat::shutdown;
pub use heartbeat::{
    Beat, CompositeTrackingStore, ConsoleTrackingStore, DriverProbe, HeartbeatLoop, LoopExit,
    OsProbe, ProcessGroup, TrackingFn, TrackingStore, TrackingStoreRef, build_tracking_store,
};
pub use supervisor::{
    ChildProcess, HeartbeatCommand, HeartbeatSupervisor, OsSpawner, SEND_HEARTBEAT, Spawn,
    SupervisorHandle,
};

// Optional: HTTP tracking store.
// Enabled by default; disable with `--no-default-features`.
#[cfg(feature = "web")]
pub use heartbeat::WebTrackingStore;

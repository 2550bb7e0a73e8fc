//! # HeartbeatSupervisor: heartbeat process bound to the driver's scope.
//!
//! The driver acquires a [`SupervisorHandle`] for the whole run. The handle owns
//! at most one heartbeat child and stops it when the scope ends, on every exit
//! path (return, `?`, panic unwind), through `Drop`.
//!
//! ## Flow
//! ```text
//! acquire(cfg)
//!   ├─ interval <= 0     ─► log "disabled"            ─► empty handle
//!   ├─ spawn fails       ─► warn (run continues)      ─► empty handle
//!   └─ spawn ok          ─► log command line          ─► handle(child)
//!
//! release() / drop
//!   ├─ no child / already released ─► no-op
//!   ├─ child already exited        ─► reap, done
//!   └─ child running               ─► SIGTERM (never waits), errors logged
//!
//! drop
//!   └─ release(), then hand the child to ChildProcess::reap (no zombies)
//! ```
//!
//! ## Rules
//! - Heartbeat failures never reach the driver: `acquire` and `release` cannot fail
//! - `release` is idempotent and races safely with the child exiting on its own
//!
//! ## Example
//! ```no_run
//! use runvisor::{HeartbeatConfig, HeartbeatSupervisor};
//!
//! let cfg = HeartbeatConfig::new("run-1").with_interval_s(5);
//! let supervisor = HeartbeatSupervisor::os();
//!
//! let outcome = supervisor.with_heartbeat(&cfg, || {
//!     // run the tasks...
//!     42
//! });
//! assert_eq!(outcome, 42);
//! ```

mod command;
mod process;

pub use command::{HeartbeatCommand, SEND_HEARTBEAT};
pub use process::{ChildProcess, OsSpawner, Spawn};

use tracing::{debug, info, warn};

use crate::config::HeartbeatConfig;
use crate::error::SupervisorError;

/// Spawns heartbeat processes for runs.
#[derive(Debug, Default, Clone)]
pub struct HeartbeatSupervisor<S = OsSpawner> {
    spawner: S,
}

impl HeartbeatSupervisor<OsSpawner> {
    /// Supervisor spawning real OS processes.
    pub fn os() -> Self {
        Self::new(OsSpawner)
    }
}

impl<S: Spawn> HeartbeatSupervisor<S> {
    /// Creates a supervisor with a custom spawner.
    pub fn new(spawner: S) -> Self {
        Self { spawner }
    }

    /// Starts the heartbeat process for `cfg`.
    ///
    /// Never fails: a disabled config or a spawn error yields an empty handle.
    pub fn acquire(&self, cfg: &HeartbeatConfig) -> SupervisorHandle {
        if !cfg.is_enabled() {
            info!(
                interval_s = cfg.interval_s,
                "run heartbeat sender disabled (set heartbeat interval to a value > 0)"
            );
            return SupervisorHandle::empty();
        }

        let command = HeartbeatCommand::from_config(cfg);
        info!(cmd = %command, "heartbeat sender cmd");

        match self.spawner.spawn(&command) {
            Ok(child) => {
                info!(pid = child.id(), run_id = %cfg.run_id, "heartbeat sender started");
                SupervisorHandle::with_child(child)
            }
            Err(source) => {
                let err = SupervisorError::Spawn {
                    command: command.to_string(),
                    source,
                };
                warn!(
                    label = err.as_label(),
                    error = %err,
                    "failed to spawn heartbeat process, you can disable it by setting the heartbeat interval to 0"
                );
                SupervisorHandle::empty()
            }
        }
    }

    /// Runs `f` with a heartbeat process alive for its duration.
    ///
    /// The process is stopped when `f` returns or unwinds.
    pub fn with_heartbeat<R>(&self, cfg: &HeartbeatConfig, f: impl FnOnce() -> R) -> R {
        let _handle = self.acquire(cfg);
        f()
    }
}

/// Scoped ownership of zero or one heartbeat process.
pub struct SupervisorHandle {
    child: Option<Box<dyn ChildProcess>>,
    released: bool,
}

impl SupervisorHandle {
    fn empty() -> Self {
        Self {
            child: None,
            released: false,
        }
    }

    fn with_child(child: Box<dyn ChildProcess>) -> Self {
        Self {
            child: Some(child),
            released: false,
        }
    }

    /// Process id of the heartbeat child, if one was spawned.
    pub fn child_id(&self) -> Option<u32> {
        self.child.as_ref().map(|c| c.id())
    }

    /// `true` if a child was spawned and the handle has not been released.
    pub fn is_active(&self) -> bool {
        self.child.is_some() && !self.released
    }

    /// Non-blocking exit check; `None` if no child was spawned.
    pub fn has_child_exited(&mut self) -> Option<bool> {
        let child = self.child.as_mut()?;
        match child.has_exited() {
            Ok(exited) => Some(exited),
            Err(e) => {
                debug!(pid = child.id(), error = %e, "failed to poll heartbeat sender");
                Some(false)
            }
        }
    }

    /// Stops the heartbeat child. Safe to call any number of times.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let Some(child) = self.child.as_mut() else {
            return;
        };
        let pid = child.id();

        if let Ok(true) = child.has_exited() {
            debug!(pid, "heartbeat sender already exited");
            return;
        }

        match child.terminate() {
            Ok(()) => info!(pid, "stopped heartbeat sender"),
            Err(source) => {
                let err = SupervisorError::Terminate { pid, source };
                warn!(label = err.as_label(), error = %err, "failed to stop heartbeat sender");
            }
        }
        // Reap if it is already gone; never wait.
        let _ = child.has_exited();
    }
}

impl Drop for SupervisorHandle {
    fn drop(&mut self) {
        self.release();
        if let Some(child) = self.child.take() {
            child.reap();
        }
    }
}

impl std::fmt::Debug for SupervisorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisorHandle")
            .field("child_id", &self.child_id())
            .field("released", &self.released)
            .finish()
    }
}

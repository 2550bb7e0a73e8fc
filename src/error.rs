//! Error types used by the heartbeat subsystem.
//!
//! This module defines three error enums:
//!
//! - [`TrackingError`] - failures reported by a [`TrackingStore`](crate::TrackingStore).
//! - [`ProbeError`] - the driver process (group) could not be resolved.
//! - [`SupervisorError`] - the heartbeat child could not be spawned or terminated.
//!
//! None of these ever reach the driver's invocation path: the loop and the
//! supervisor log them and carry on. They exist so log lines stay structured
//! and tests can match on the failure kind.

use thiserror::Error;

/// # Errors produced by a tracking store.
///
/// Every variant is treated as transient by the heartbeat loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TrackingError {
    /// The request never reached the store (connection refused, DNS, timeout).
    #[error("transport error: {error}")]
    Transport {
        /// The underlying error message.
        error: String,
    },

    /// The store answered but refused the heartbeat (auth, unknown run, 5xx).
    #[error("rejected by tracker (status {status}): {body}")]
    Rejected {
        /// HTTP-like status code returned by the store.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The requested tracker or tracker API is not available in this build.
    #[error("unsupported tracker: {name}")]
    Unsupported {
        /// Tracker or API name as given on the command line.
        name: String,
    },

    /// Any other store-specific failure.
    #[error("tracking failed: {error}")]
    Other {
        /// The underlying error message.
        error: String,
    },
}

impl TrackingError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use runvisor::TrackingError;
    ///
    /// let err = TrackingError::Rejected { status: 401, body: String::new() };
    /// assert_eq!(err.as_label(), "tracking_rejected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TrackingError::Transport { .. } => "tracking_transport",
            TrackingError::Rejected { .. } => "tracking_rejected",
            TrackingError::Unsupported { .. } => "tracking_unsupported",
            TrackingError::Other { .. } => "tracking_other",
        }
    }

    /// Shorthand for [`TrackingError::Other`].
    pub fn other(error: impl Into<String>) -> Self {
        TrackingError::Other {
            error: error.into(),
        }
    }
}

/// # Errors produced while resolving the driver process.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// No process (or process group) with this id is visible any more.
    #[error("driver process {pid} not found")]
    NotFound {
        /// The driver process id that was probed.
        pid: u32,
    },

    /// The id can never name a driver (`0`, or out of range for the platform).
    #[error("invalid driver pid {pid}")]
    InvalidPid {
        /// The rejected process id.
        pid: u32,
    },
}

/// # Errors produced by the heartbeat supervisor.
///
/// These are logged by [`HeartbeatSupervisor`](crate::HeartbeatSupervisor) and
/// never returned to the owning scope.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The child process could not be started.
    #[error("failed to spawn heartbeat process `{command}`: {source}")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// OS error.
        #[source]
        source: std::io::Error,
    },

    /// The termination signal could not be delivered.
    #[error("failed to terminate heartbeat process {pid}: {source}")]
    Terminate {
        /// Child process id.
        pid: u32,
        /// OS error.
        #[source]
        source: std::io::Error,
    },
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::Spawn { .. } => "heartbeat_spawn_failed",
            SupervisorError::Terminate { .. } => "heartbeat_terminate_failed",
        }
    }
}

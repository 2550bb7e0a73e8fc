//! # Heartbeat configuration.
//!
//! Provides [`HeartbeatConfig`], the settings the driver hands to
//! [`HeartbeatSupervisor::acquire`](crate::HeartbeatSupervisor::acquire).
//!
//! ## Sentinel values
//! - `interval_s <= 0` → heartbeat subsystem disabled (no child spawned)
//! - `trackers` empty → the child falls back to the `console` tracker

use std::path::PathBuf;
use std::time::Duration;

/// Default heartbeat interval, in seconds.
pub const DEFAULT_INTERVAL_S: i64 = 5;

/// Default executable used for the heartbeat child.
pub const DEFAULT_PROGRAM: &str = "runvisor";

/// Settings for one run's liveness reporting.
///
/// ## Field semantics
/// - `run_id`: opaque run identifier reported on every heartbeat
/// - `tracker_url`: base URL of the tracking service
/// - `trackers`: tracker names (`console`, `api`), joined with `,` on the command line
/// - `tracker_api`: API flavour for the `api` tracker (`web`)
/// - `interval_s`: seconds between heartbeats (`<= 0` = disabled)
/// - `driver_pid`: process the child watches; the child exits once it is gone
/// - `program`: executable that understands `send-heartbeat`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Run identifier.
    pub run_id: String,
    /// Tracking service base URL.
    pub tracker_url: String,
    /// Enabled tracker names.
    pub trackers: Vec<String>,
    /// Tracker API selector.
    pub tracker_api: String,
    /// Heartbeat interval in seconds.
    pub interval_s: i64,
    /// Driver process id.
    pub driver_pid: u32,
    /// Heartbeat child executable.
    pub program: PathBuf,
}

impl HeartbeatConfig {
    /// Creates a config for `run_id` watched from the current process.
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Self::default()
        }
    }

    /// Sets the heartbeat interval in seconds.
    #[must_use]
    pub fn with_interval_s(mut self, interval_s: i64) -> Self {
        self.interval_s = interval_s;
        self
    }

    /// Sets the tracking service URL.
    #[must_use]
    pub fn with_tracker_url(mut self, url: impl Into<String>) -> Self {
        self.tracker_url = url.into();
        self
    }

    /// Replaces the tracker list.
    #[must_use]
    pub fn with_trackers<I, S>(mut self, trackers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trackers = trackers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the executable spawned for the heartbeat child.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Returns `true` if a heartbeat child should be spawned.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.interval_s > 0
    }

    /// Returns the heartbeat period as an `Option`.
    ///
    /// - `None` → disabled
    /// - `Some(d)` → one heartbeat every `d`, measured from iteration start
    #[inline]
    pub fn interval(&self) -> Option<Duration> {
        u64::try_from(self.interval_s)
            .ok()
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }

    /// Tracker names as passed to `--tracker`.
    pub fn trackers_arg(&self) -> String {
        self.trackers.join(",")
    }
}

impl Default for HeartbeatConfig {
    /// Default configuration:
    ///
    /// - `run_id = ""`
    /// - `tracker_url = "http://localhost:8080"`
    /// - `trackers = ["console"]`
    /// - `tracker_api = "web"`
    /// - `interval_s = 5`
    /// - `driver_pid = std::process::id()`
    /// - `program = "runvisor"`
    fn default() -> Self {
        Self {
            run_id: String::new(),
            tracker_url: "http://localhost:8080".to_string(),
            trackers: vec!["console".to_string()],
            tracker_api: "web".to_string(),
            interval_s: DEFAULT_INTERVAL_S,
            driver_pid: std::process::id(),
            program: PathBuf::from(DEFAULT_PROGRAM),
        }
    }
}

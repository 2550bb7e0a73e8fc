//! # HeartbeatLoop: drift-corrected liveness reporting.
//!
//! Runs inside the heartbeat process and reports "driver is alive" to a
//! [`TrackingStore`](crate::TrackingStore) once per interval until the driver
//! disappears or the process is interrupted.
//!
//! ## Architecture
//! ```text
//! loop {
//!   ├─► loop_start = now()
//!   ├─► beat_once()
//!   │     ├─► probe.resolve_process_group(driver_pid)
//!   │     │     └─ Err ──► DriverGone ──► exit
//!   │     └─► store.heartbeat(run_id)
//!   │           └─ Err ──► log error, keep going
//!   └─► sleep_until(loop_start + interval)
//! }
//! token cancelled (SIGTERM/SIGINT) at any await ──► Interrupted ──► exit
//! ```
//!
//! ## Rules
//! - The period is measured from iteration **start**, so slow heartbeats never
//!   push the schedule back (no drift accumulation).
//! - There is no error budget: store failures are retried forever at the interval.
//! - The loop is the only writer of liveness for its run.
//! - A zero interval means "disabled": `run` returns at once, it never spins.

use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::heartbeat::probe::{DriverProbe, OsProbe};
use crate::heartbeat::store::TrackingStoreRef;

/// Outcome of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Beat {
    /// Driver alive, heartbeat recorded.
    Sent,
    /// Driver alive, the store call failed.
    Failed,
    /// Driver could not be resolved; no heartbeat was sent.
    DriverGone,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The driver process (group) is no longer visible.
    DriverGone,
    /// The cancellation token fired (interrupt or termination signal).
    Interrupted,
    /// The interval is zero; no heartbeat was attempted.
    Disabled,
}

/// Sleep deadline used when `loop_start + interval` does not fit in an [`Instant`].
fn far_future() -> Instant {
    // ~30 years.
    Instant::now() + Duration::from_secs(86_400 * 365 * 30)
}

/// Liveness reporter for one run.
pub struct HeartbeatLoop {
    run_id: String,
    store: TrackingStoreRef,
    probe: Arc<dyn DriverProbe>,
    interval: Duration,
    driver_pid: u32,
}

impl HeartbeatLoop {
    /// Creates a loop that watches `driver_pid` through the OS probe.
    pub fn new(
        run_id: impl Into<String>,
        store: TrackingStoreRef,
        interval: Duration,
        driver_pid: u32,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            store,
            probe: Arc::new(OsProbe),
            interval,
            driver_pid,
        }
    }

    /// Replaces the driver probe.
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn DriverProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Configured period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs one liveness check and, if the driver is alive, one heartbeat.
    pub async fn beat_once(&self) -> Beat {
        if let Err(e) = self.probe.resolve_process_group(self.driver_pid) {
            info!(
                driver_pid = self.driver_pid,
                reason = %e,
                "driver process stopped, stopping heartbeat sender"
            );
            return Beat::DriverGone;
        }

        match self.store.heartbeat(&self.run_id).await {
            Ok(()) => {
                debug!(run_id = %self.run_id, tracker = self.store.name(), "heartbeat sent");
                Beat::Sent
            }
            Err(e) => {
                error!(
                    run_id = %self.run_id,
                    tracker = self.store.name(),
                    label = e.as_label(),
                    error = %e,
                    "failed to send heartbeat"
                );
                Beat::Failed
            }
        }
    }

    /// Runs until the driver disappears or `token` is cancelled.
    ///
    /// ### Cancellation semantics
    /// - `token` is observed during the heartbeat call and during the sleep
    /// - cancellation aborts an in-flight heartbeat immediately
    ///
    /// A zero interval returns [`LoopExit::Disabled`] without touching the store.
    pub async fn run(self, token: CancellationToken) -> LoopExit {
        if self.interval.is_zero() {
            info!(
                run_id = %self.run_id,
                "heartbeat interval is zero, heartbeat sender disabled"
            );
            return LoopExit::Disabled;
        }

        info!(
            pid = std::process::id(),
            interval_s = self.interval.as_secs(),
            driver_pid = self.driver_pid,
            "starting heartbeat sender process"
        );

        let exit = loop {
            let loop_start = Instant::now();

            let beat = select! {
                biased;
                _ = token.cancelled() => break LoopExit::Interrupted,
                beat = self.beat_once() => beat,
            };
            if beat == Beat::DriverGone {
                break LoopExit::DriverGone;
            }

            let deadline = loop_start
                .checked_add(self.interval)
                .unwrap_or_else(far_future);
            select! {
                biased;
                _ = token.cancelled() => break LoopExit::Interrupted,
                _ = time::sleep_until(deadline) => {}
            }
        };

        info!(reason = ?exit, "stopping heartbeat sender");
        exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProbeError, TrackingError};
    use crate::heartbeat::probe::ProcessGroup;
    use crate::heartbeat::store::TrackingFn;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INTERVAL: Duration = Duration::from_secs(5);

    /// Store recording the (virtual) time of every call; fails on the listed calls (1-based).
    fn recording_store(
        fail_on: &'static [usize],
        work: Duration,
    ) -> (TrackingStoreRef, Arc<Mutex<Vec<Instant>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = calls.clone();
        let store: TrackingStoreRef = TrackingFn::arc("recording", move |_run: String| {
            let seen = seen.clone();
            async move {
                let n = {
                    let mut seen = seen.lock().unwrap();
                    seen.push(Instant::now());
                    seen.len()
                };
                time::sleep(work).await;
                if fail_on.contains(&n) {
                    Err(TrackingError::Transport {
                        error: "connection reset".into(),
                    })
                } else {
                    Ok(())
                }
            }
        });
        (store, calls)
    }

    /// Probe that reports the driver alive for the first `alive_checks` checks.
    fn countdown_probe(alive_checks: usize) -> (Arc<dyn DriverProbe>, Arc<AtomicUsize>) {
        let checks = Arc::new(AtomicUsize::new(0));
        let seen = checks.clone();
        let probe = move |pid: u32| {
            if seen.fetch_add(1, Ordering::SeqCst) < alive_checks {
                Ok(ProcessGroup { id: pid })
            } else {
                Err(ProbeError::NotFound { pid })
            }
        };
        let probe: Arc<dyn DriverProbe> = Arc::new(probe);
        (probe, checks)
    }

    fn assert_near(actual: Duration, expected: Duration) {
        let diff = actual.abs_diff(expected);
        assert!(
            diff <= Duration::from_millis(10),
            "expected ~{expected:?}, got {actual:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_heartbeat_is_retried_next_interval() {
        let (store, calls) = recording_store(&[2], Duration::ZERO);
        let (probe, _) = countdown_probe(4);
        let lp = HeartbeatLoop::new("run-1", store, INTERVAL, 4242).with_probe(probe);

        let start = Instant::now();
        let exit = lp.run(CancellationToken::new()).await;

        assert_eq!(exit, LoopExit::DriverGone);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        for (i, at) in calls.iter().enumerate() {
            assert_near(*at - start, INTERVAL * i as u32);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_heartbeats_do_not_drift() {
        let (store, calls) = recording_store(&[], Duration::from_secs(2));
        let (probe, _) = countdown_probe(5);
        let lp = HeartbeatLoop::new("run-1", store, INTERVAL, 4242).with_probe(probe);

        let start = Instant::now();
        lp.run(CancellationToken::new()).await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 5);
        // N iterations span 5 * (N - 1) seconds.
        assert_near(*calls.last().unwrap() - start, INTERVAL * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn overlong_heartbeat_starts_next_iteration_immediately() {
        let (store, calls) = recording_store(&[], Duration::from_secs(7));
        let (probe, _) = countdown_probe(3);
        let lp = HeartbeatLoop::new("run-1", store, INTERVAL, 4242).with_probe(probe);

        let start = Instant::now();
        lp.run(CancellationToken::new()).await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_near(calls[1] - start, Duration::from_secs(7));
        assert_near(calls[2] - start, Duration::from_secs(14));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_driver_exits_without_heartbeat() {
        let (store, calls) = recording_store(&[], Duration::ZERO);
        let (probe, checks) = countdown_probe(0);
        let lp = HeartbeatLoop::new("run-1", store, INTERVAL, 4242).with_probe(probe);

        let start = Instant::now();
        let exit = lp.run(CancellationToken::new()).await;

        assert_eq!(exit, LoopExit::DriverGone);
        assert_eq!(checks.load(Ordering::SeqCst), 1);
        assert!(calls.lock().unwrap().is_empty());
        assert!(Instant::now() - start < INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_sleep() {
        let (store, calls) = recording_store(&[], Duration::ZERO);
        let (probe, _) = countdown_probe(usize::MAX);
        let lp = HeartbeatLoop::new("run-1", store, INTERVAL, 4242).with_probe(probe);

        let token = CancellationToken::new();
        let handle = tokio::spawn(lp.run(token.clone()));

        time::sleep(Duration::from_secs(12)).await;
        token.cancel();

        assert_eq!(handle.await.unwrap(), LoopExit::Interrupted);
        // Beats at 0s, 5s and 10s.
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_aborts_inflight_heartbeat() {
        let (store, calls) = recording_store(&[], Duration::from_secs(3600));
        let (probe, _) = countdown_probe(usize::MAX);
        let lp = HeartbeatLoop::new("run-1", store, INTERVAL, 4242).with_probe(probe);

        let token = CancellationToken::new();
        let handle = tokio::spawn(lp.run(token.clone()));

        time::sleep(Duration::from_secs(1)).await;
        token.cancel();

        assert_eq!(handle.await.unwrap(), LoopExit::Interrupted);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn huge_interval_sleeps_instead_of_overflowing() {
        let (store, calls) = recording_store(&[], Duration::ZERO);
        let (probe, _) = countdown_probe(usize::MAX);
        let interval = Duration::from_secs(i64::MAX as u64);
        let lp = HeartbeatLoop::new("run-1", store, interval, 4242).with_probe(probe);

        let token = CancellationToken::new();
        let handle = tokio::spawn(lp.run(token.clone()));

        time::sleep(Duration::from_secs(3600)).await;
        token.cancel();

        assert_eq!(handle.await.unwrap(), LoopExit::Interrupted);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_disabled() {
        let (store, calls) = recording_store(&[], Duration::ZERO);
        let (probe, checks) = countdown_probe(usize::MAX);
        let lp = HeartbeatLoop::new("run-1", store, Duration::ZERO, 4242).with_probe(probe);

        let start = Instant::now();
        let exit = lp.run(CancellationToken::new()).await;

        assert_eq!(exit, LoopExit::Disabled);
        assert_eq!(checks.load(Ordering::SeqCst), 0);
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test]
    async fn beat_once_reports_outcome() {
        let (store, _) = recording_store(&[1], Duration::ZERO);
        let (probe, _) = countdown_probe(2);
        let lp = HeartbeatLoop::new("run-1", store, INTERVAL, 4242).with_probe(probe);

        assert_eq!(lp.beat_once().await, Beat::Failed);
        assert_eq!(lp.beat_once().await, Beat::Sent);
        assert_eq!(lp.beat_once().await, Beat::DriverGone);
    }
}

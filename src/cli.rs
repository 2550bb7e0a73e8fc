//! # Command line of the `runvisor` binary.
//!
//! ## Commands
//! - `runvisor send-heartbeat` - run the heartbeat loop for one run (spawned by
//!   [`HeartbeatSupervisor`](crate::HeartbeatSupervisor))
//!
//! ## Environment
//! - `RUNVISOR_TRACKER_URL` - tracking service URL (default: `http://localhost:8080`)
//! - `RUNVISOR_HEARTBEAT_INTERVAL_S` - heartbeat interval in seconds
//! - `RUNVISOR_API_TOKEN` - bearer token for the `api` tracker (inherited from the driver)

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::heartbeat::{HeartbeatLoop, LoopExit, build_tracking_store};

/// runvisor - task invocation and liveness supervision.
#[derive(Debug, Parser)]
#[command(name = "runvisor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report driver liveness until the driver exits or a signal arrives.
    SendHeartbeat(SendHeartbeatArgs),
}

/// Arguments of `send-heartbeat`.
#[derive(Debug, Clone, Args)]
pub struct SendHeartbeatArgs {
    /// Run identifier reported with every heartbeat.
    #[arg(long)]
    pub run_uid: String,

    /// Tracking service URL.
    #[arg(long, env = "RUNVISOR_TRACKER_URL", default_value = "http://localhost:8080")]
    pub tracking_url: String,

    /// Process id of the driver; the loop stops once it is gone.
    #[arg(long)]
    pub driver_pid: u32,

    /// Seconds between heartbeats (must be > 0).
    #[arg(
        long,
        env = "RUNVISOR_HEARTBEAT_INTERVAL_S",
        allow_negative_numbers = true
    )]
    pub heartbeat_interval: i64,

    /// Comma-separated tracker names (`console`, `api`).
    #[arg(long, value_delimiter = ',', default_value = "console")]
    pub tracker: Vec<String>,

    /// API flavour for the `api` tracker.
    #[arg(long, default_value = "web")]
    pub tracker_api: String,

    /// Bearer token for the `api` tracker.
    #[arg(long, env = "RUNVISOR_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,
}

impl SendHeartbeatArgs {
    /// Heartbeat period, `None` if the interval is not positive.
    pub fn interval(&self) -> Option<Duration> {
        u64::try_from(self.heartbeat_interval)
            .ok()
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }
}

/// Runs the heartbeat loop described by `args` until it stops or `token` is
/// cancelled.
///
/// Signal wiring is left to the caller, see
/// [`cancel_on_shutdown_signal`](crate::shutdown::cancel_on_shutdown_signal).
///
/// # Errors
///
/// Returns an error if the interval is not positive or the tracker selection
/// is invalid. Failures while the loop runs are logged, never returned.
pub async fn send_heartbeat(
    args: SendHeartbeatArgs,
    token: CancellationToken,
) -> Result<LoopExit> {
    let Some(interval) = args.interval() else {
        bail!(
            "--heartbeat-interval must be > 0 (got {})",
            args.heartbeat_interval
        );
    };

    let store = build_tracking_store(
        &args.tracker,
        &args.tracker_api,
        &args.tracking_url,
        args.api_token.as_deref(),
    )
    .context("failed to configure tracking store")?;

    let exit = HeartbeatLoop::new(args.run_uid, store, interval, args.driver_pid)
        .run(token)
        .await;
    Ok(exit)
}

//! runvisor - entry point of the heartbeat process.

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use runvisor::cli::{Cli, Commands, send_heartbeat};
use runvisor::shutdown;

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    // Before anything else: the supervisor may send SIGTERM right after spawn.
    let token = CancellationToken::new();
    let signals = {
        let _guard = runtime.enter();
        shutdown::cancel_on_shutdown_signal(token.clone())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = signals {
        warn!(error = %e, "failed to install signal handlers");
    }

    let cli = Cli::parse();

    runtime.block_on(async {
        match cli.command {
            Commands::SendHeartbeat(args) => {
                let exit = send_heartbeat(args, token).await?;
                info!(reason = ?exit, "heartbeat sender exited");
                Ok(())
            }
        }
    })
}

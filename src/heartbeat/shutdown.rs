//! # Interrupt handling for the heartbeat process.
//!
//! The supervisor stops its heartbeat child with `SIGTERM`; an operator may hit
//! Ctrl-C. Both end the loop cleanly with exit status 0.
//!
//! Listeners are registered synchronously by [`ShutdownSignals::install`], so a
//! signal that arrives before the runtime first polls anything is still caught
//! instead of hitting the default disposition.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (sent by [`SupervisorHandle::release`](crate::SupervisorHandle::release))
//! - `SIGQUIT`
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::windows::ctrl_c`]

use std::io;

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Registered termination-signal listeners.
#[derive(Debug)]
pub struct ShutdownSignals {
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigquit: tokio::signal::unix::Signal,
    #[cfg(windows)]
    ctrl_c: tokio::signal::windows::CtrlC,
}

impl ShutdownSignals {
    /// Registers the listeners right away.
    ///
    /// Must be called within a tokio runtime context (e.g. under
    /// [`Runtime::enter`](tokio::runtime::Runtime::enter)).
    #[cfg(unix)]
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
            sigquit: signal(SignalKind::quit())?,
        })
    }

    /// Registers the listener right away.
    #[cfg(windows)]
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    /// Resolves on the first signal received since [`install`](Self::install).
    #[cfg(unix)]
    pub async fn recv(&mut self) {
        tokio::select! {
            _ = self.sigint.recv()  => {},
            _ = self.sigterm.recv() => {},
            _ = self.sigquit.recv() => {},
        }
    }

    /// Resolves on the first Ctrl-C received since [`install`](Self::install).
    #[cfg(windows)]
    pub async fn recv(&mut self) {
        self.ctrl_c.recv().await;
    }
}

/// Cancels `token` on the first termination signal.
///
/// Handlers are installed before this returns; the waiting task runs once the
/// runtime is driven. Must be called within a tokio runtime context.
///
/// # Errors
///
/// Returns the registration error; the default signal disposition then applies.
pub fn cancel_on_shutdown_signal(token: CancellationToken) -> io::Result<()> {
    let mut signals = ShutdownSignals::install()?;
    tokio::spawn(async move {
        signals.recv().await;
        info!("stopping heartbeat sender process due to interrupt");
        token.cancel();
    });
    Ok(())
}

//! # Process control for the heartbeat child.
//!
//! [`Spawn`] starts the child and [`ChildProcess`] inspects and stops it.
//! [`OsSpawner`] is the real implementation on top of [`std::process`].
//!
//! ## Rules
//! - `has_exited` never blocks (it is a `try_wait`)
//! - `terminate` on an already exited child succeeds
//! - termination is a request (`SIGTERM` on unix); nothing here waits for the exit
//! - `reap` collects the exit status off the caller's thread, so a terminated
//!   child never lingers as a zombie

use std::io;
use std::process::{Child, Command, Stdio};

use tracing::warn;

use crate::supervisor::HeartbeatCommand;

/// A started heartbeat process.
pub trait ChildProcess: Send {
    /// OS process id.
    fn id(&self) -> u32;

    /// Non-blocking exit check; reaps the child if it has exited.
    fn has_exited(&mut self) -> io::Result<bool>;

    /// Asks the child to stop.
    fn terminate(&mut self) -> io::Result<()>;

    /// Gives up ownership; the exit status is collected without blocking the caller.
    fn reap(self: Box<Self>);
}

/// Starts heartbeat processes.
pub trait Spawn: Send + Sync {
    /// Starts `command` as a detached child.
    fn spawn(&self, command: &HeartbeatCommand) -> io::Result<Box<dyn ChildProcess>>;
}

/// Spawner backed by [`std::process::Command`].
///
/// The child inherits stdout/stderr (its logs land next to the driver's) and
/// gets a closed stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSpawner;

impl Spawn for OsSpawner {
    fn spawn(&self, command: &HeartbeatCommand) -> io::Result<Box<dyn ChildProcess>> {
        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .spawn()?;
        Ok(Box::new(child))
    }
}

impl ChildProcess for Child {
    fn id(&self) -> u32 {
        Child::id(self)
    }

    fn has_exited(&mut self) -> io::Result<bool> {
        Ok(self.try_wait()?.is_some())
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> io::Result<()> {
        // A reaped pid may already belong to someone else.
        if self.try_wait()?.is_some() {
            return Ok(());
        }
        let pid = libc::pid_t::try_from(Child::id(self))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        // SAFETY: `pid` is our own unreaped child, so it cannot have been recycled.
        if unsafe { libc::kill(pid, libc::SIGTERM) } == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            Ok(())
        } else {
            Err(err)
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> io::Result<()> {
        self.kill()
    }

    fn reap(mut self: Box<Self>) {
        if let Ok(Some(_)) = self.try_wait() {
            return;
        }
        let pid = Child::id(&self);
        let reaper = std::thread::Builder::new()
            .name(format!("heartbeat-reaper-{pid}"))
            .spawn(move || {
                let _ = self.wait();
            });
        if let Err(e) = reaper {
            warn!(pid, error = %e, "failed to start heartbeat reaper thread");
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_exit(child: &mut dyn ChildProcess) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if child.has_exited().unwrap() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        false
    }

    #[test]
    fn terminate_stops_running_child() {
        let mut child: Box<dyn ChildProcess> =
            Box::new(Command::new("sleep").arg("30").spawn().unwrap());

        assert!(!child.has_exited().unwrap());
        child.terminate().unwrap();
        assert!(wait_exit(child.as_mut()));
    }

    #[test]
    fn terminate_after_exit_is_ok() {
        let mut child: Box<dyn ChildProcess> = Box::new(Command::new("true").spawn().unwrap());

        assert!(wait_exit(child.as_mut()));
        child.terminate().unwrap();
        child.terminate().unwrap();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn reap_collects_terminated_child() {
        let cmd = HeartbeatCommand {
            program: "sleep".into(),
            args: vec!["30".into()],
        };
        let mut child = OsSpawner.spawn(&cmd).unwrap();
        let pid = child.id();

        child.terminate().unwrap();
        child.reap();

        let proc_dir = std::path::PathBuf::from(format!("/proc/{pid}"));
        let deadline = Instant::now() + Duration::from_secs(5);
        while proc_dir.exists() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(!proc_dir.exists(), "pid {pid} was never reaped");
    }

    #[test]
    fn reap_of_exited_child_returns() {
        let mut child: Box<dyn ChildProcess> = Box::new(Command::new("true").spawn().unwrap());

        assert!(wait_exit(child.as_mut()));
        child.reap();
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let cmd = HeartbeatCommand {
            program: "/nonexistent/runvisor".into(),
            args: vec![],
        };
        assert!(OsSpawner.spawn(&cmd).is_err());
    }
}

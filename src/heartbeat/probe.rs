//! # Driver liveness probe.
//!
//! The heartbeat process watches the driver by resolving the driver's process
//! group. Resolution failing means the driver is gone (normal exit or crash)
//! and the heartbeat process should stop.
//!
//! ## Platforms
//! - **Unix**: `getpgid(pid)`; `ESRCH` → gone, `EPERM` → alive (exists, not ours to inspect)
//! - **Other**: no introspection; the driver is always reported alive and the
//!   heartbeat process relies on the supervisor's termination signal

use crate::error::ProbeError;

/// Process group of a live driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessGroup {
    /// Process group id (the driver pid itself when the group is not observable).
    pub id: u32,
}

/// Resolves the process group of the driver.
///
/// Any closure `Fn(u32) -> Result<ProcessGroup, ProbeError>` is a probe.
pub trait DriverProbe: Send + Sync + 'static {
    /// Returns the driver's process group, or an error if it is no longer visible.
    fn resolve_process_group(&self, pid: u32) -> Result<ProcessGroup, ProbeError>;
}

impl<F> DriverProbe for F
where
    F: Fn(u32) -> Result<ProcessGroup, ProbeError> + Send + Sync + 'static,
{
    fn resolve_process_group(&self, pid: u32) -> Result<ProcessGroup, ProbeError> {
        self(pid)
    }
}

/// Probe backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsProbe;

#[cfg(unix)]
impl DriverProbe for OsProbe {
    fn resolve_process_group(&self, pid: u32) -> Result<ProcessGroup, ProbeError> {
        // getpgid(0) answers for the calling process, never for a driver.
        if pid == 0 {
            return Err(ProbeError::InvalidPid { pid });
        }
        let raw = libc::pid_t::try_from(pid).map_err(|_| ProbeError::InvalidPid { pid })?;

        // SAFETY: getpgid only reads kernel process tables.
        let pgid = unsafe { libc::getpgid(raw) };
        if pgid >= 0 {
            return Ok(ProcessGroup { id: pgid as u32 });
        }
        match std::io::Error::last_os_error().raw_os_error() {
            Some(libc::EPERM) => Ok(ProcessGroup { id: pid }),
            _ => Err(ProbeError::NotFound { pid }),
        }
    }
}

#[cfg(not(unix))]
impl DriverProbe for OsProbe {
    fn resolve_process_group(&self, pid: u32) -> Result<ProcessGroup, ProbeError> {
        if pid == 0 {
            return Err(ProbeError::InvalidPid { pid });
        }
        Ok(ProcessGroup { id: pid })
    }
}

//! End-to-end tests driving the real `runvisor` binary as the heartbeat process.
#![cfg(unix)]

use std::process::{Child, Command};
use std::thread::sleep;
use std::time::{Duration, Instant};

use runvisor::{HeartbeatCommand, HeartbeatConfig, HeartbeatSupervisor};

const BIN: &str = env!("CARGO_BIN_EXE_runvisor");

fn config(interval_s: i64) -> HeartbeatConfig {
    HeartbeatConfig::new("it-run")
        .with_interval_s(interval_s)
        .with_trackers(["console"])
        .with_program(BIN)
}

/// Polls `check` until it returns true or `timeout` passes.
fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        sleep(Duration::from_millis(25));
    }
    false
}

fn wait_child(child: &mut Child, timeout: Duration) -> Option<std::process::ExitStatus> {
    let mut status = None;
    eventually(timeout, || {
        status = child.try_wait().unwrap();
        status.is_some()
    });
    status
}

/// Pid of a process that has exited and been reaped.
fn dead_pid() -> u32 {
    let mut child = Command::new("true").spawn().unwrap();
    let pid = child.id();
    child.wait().unwrap();
    pid
}

#[test]
fn release_stops_running_heartbeat_process() {
    let supervisor = HeartbeatSupervisor::os();
    let mut handle = supervisor.acquire(&config(1));

    assert!(handle.is_active());
    assert!(handle.child_id().is_some());

    sleep(Duration::from_millis(1500));
    assert_eq!(handle.has_child_exited(), Some(false));

    handle.release();
    assert!(eventually(Duration::from_secs(5), || {
        handle.has_child_exited() == Some(true)
    }));

    // Second release after exit: no error, no hang.
    handle.release();
}

#[test]
fn heartbeat_process_exits_when_driver_is_gone() {
    let mut cfg = config(1);
    cfg.driver_pid = dead_pid();
    let cmd = HeartbeatCommand::from_config(&cfg);

    let mut child = Command::new(&cmd.program).args(&cmd.args).spawn().unwrap();
    let status = wait_child(&mut child, Duration::from_secs(5)).expect("heartbeat process hung");
    assert!(status.success());
}

#[test]
fn early_sigterm_exits_cleanly() {
    let cmd = HeartbeatCommand::from_config(&config(5));

    for _ in 0..5 {
        let mut child = Command::new(&cmd.program).args(&cmd.args).spawn().unwrap();
        sleep(Duration::from_millis(20));

        let pid = libc::pid_t::try_from(child.id()).unwrap();
        // SAFETY: `child` is ours and not yet waited on.
        assert_eq!(unsafe { libc::kill(pid, libc::SIGTERM) }, 0);

        let status = wait_child(&mut child, Duration::from_secs(5)).expect("heartbeat process hung");
        assert!(status.success(), "terminated by signal: {status:?}");
    }
}

#[cfg(target_os = "linux")]
#[test]
fn dropped_handles_leave_no_zombies() {
    let pids: Vec<u32> = (0..3)
        .map(|_| {
            let handle = HeartbeatSupervisor::os().acquire(&config(1));
            sleep(Duration::from_millis(200));
            handle.child_id().unwrap()
        })
        .collect();

    for pid in pids {
        let proc_dir = std::path::PathBuf::from(format!("/proc/{pid}"));
        assert!(
            eventually(Duration::from_secs(5), || !proc_dir.exists()),
            "heartbeat child {pid} left behind"
        );
    }
}

#[test]
fn heartbeat_process_rejects_non_positive_interval() {
    let cmd = HeartbeatCommand::from_config(&config(0));

    let status = Command::new(&cmd.program).args(&cmd.args).status().unwrap();
    assert!(!status.success());
}

#[test]
fn release_after_child_exited_on_its_own() {
    let mut cfg = config(1);
    cfg.driver_pid = dead_pid();

    let mut handle = HeartbeatSupervisor::os().acquire(&cfg);
    assert!(eventually(Duration::from_secs(5), || {
        handle.has_child_exited() == Some(true)
    }));

    handle.release();
    handle.release();
}

#[test]
fn missing_program_does_not_abort_scope() {
    let cfg = config(1).with_program("/nonexistent/runvisor");

    let handle = HeartbeatSupervisor::os().acquire(&cfg);
    assert!(!handle.is_active());

    let out = HeartbeatSupervisor::os().with_heartbeat(&cfg, || 2 + 2);
    assert_eq!(out, 4);
}

//! Command line for the heartbeat process.

use std::fmt;
use std::path::PathBuf;

use crate::config::HeartbeatConfig;

/// Subcommand understood by the `runvisor` binary.
pub const SEND_HEARTBEAT: &str = "send-heartbeat";

/// Program and arguments used to start the heartbeat process.
///
/// ```text
/// <program> send-heartbeat --run-uid <id> --tracking-url <url> --driver-pid <pid>
///           --heartbeat-interval <s> --tracker <a,b> --tracker-api <api>
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeartbeatCommand {
    /// Executable.
    pub program: PathBuf,
    /// Arguments, without the program.
    pub args: Vec<String>,
}

impl HeartbeatCommand {
    /// Builds the command line for `cfg`.
    pub fn from_config(cfg: &HeartbeatConfig) -> Self {
        let args = vec![
            SEND_HEARTBEAT.to_string(),
            "--run-uid".to_string(),
            cfg.run_id.clone(),
            "--tracking-url".to_string(),
            cfg.tracker_url.clone(),
            "--driver-pid".to_string(),
            cfg.driver_pid.to_string(),
            "--heartbeat-interval".to_string(),
            cfg.interval_s.to_string(),
            "--tracker".to_string(),
            cfg.trackers_arg(),
            "--tracker-api".to_string(),
            cfg.tracker_api.clone(),
        ];
        Self {
            program: cfg.program.clone(),
            args,
        }
    }

    /// Value following `flag`, if present.
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for HeartbeatCommand {
    /// Shell-like rendering for logs; arguments with whitespace are quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    if s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '"') {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> HeartbeatConfig {
        HeartbeatConfig {
            run_id: "run-42".into(),
            tracker_url: "http://tracker:8080".into(),
            trackers: vec!["console".into(), "api".into()],
            tracker_api: "web".into(),
            interval_s: 5,
            driver_pid: 1234,
            program: PathBuf::from("/usr/bin/runvisor"),
        }
    }

    #[test]
    fn embeds_every_parameter() {
        let cmd = HeartbeatCommand::from_config(&cfg());

        assert_eq!(cmd.program, PathBuf::from("/usr/bin/runvisor"));
        assert_eq!(cmd.args[0], SEND_HEARTBEAT);
        assert_eq!(cmd.arg_value("--run-uid"), Some("run-42"));
        assert_eq!(cmd.arg_value("--tracking-url"), Some("http://tracker:8080"));
        assert_eq!(cmd.arg_value("--driver-pid"), Some("1234"));
        assert_eq!(cmd.arg_value("--heartbeat-interval"), Some("5"));
        assert_eq!(cmd.arg_value("--tracker"), Some("console,api"));
        assert_eq!(cmd.arg_value("--tracker-api"), Some("web"));
    }

    #[test]
    fn display_quotes_whitespace() {
        let mut c = cfg();
        c.run_id = "my run".into();
        c.trackers.clear();
        let rendered = HeartbeatCommand::from_config(&c).to_string();

        assert!(rendered.starts_with("/usr/bin/runvisor send-heartbeat"));
        assert!(rendered.contains("--run-uid \"my run\""), "{rendered}");
        assert!(rendered.contains("--tracker \"\""), "{rendered}");
    }
}

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Spawns external tools in the project directory with an explicit
/// environment overlay.
#[derive(Debug, Clone)]
pub struct Runner {
    cwd: PathBuf,
    env: Vec<(String, String)>,
}

impl Runner {
    pub fn new(cwd: impl Into<PathBuf>, env: Vec<(String, String)>) -> Self {
        Self {
            cwd: cwd.into(),
            env,
        }
    }

    fn command(&self, cmd: &str, args: &[&str]) -> Command {
        let mut command = Command::new(cmd);
        command.args(args).current_dir(&self.cwd);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command
    }

    /// Run a command and inherit stdio (shows output in real-time)
    pub fn run(&self, cmd: &str, args: &[&str]) -> Result<()> {
        log::debug!("{} {}", cmd, args.join(" "));
        let status = self
            .command(cmd, args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

        if !status.success() {
            bail!("Command failed ({status}): {} {}", cmd, args.join(" "));
        }
        Ok(())
    }

    /// Run a command and capture output
    pub fn run_capture(&self, cmd: &str, args: &[&str]) -> Result<String> {
        log::debug!("{} {}", cmd, args.join(" "));
        let output = self
            .command(cmd, args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Command failed: {} {}: {}", cmd, args.join(" "), stderr.trim())
        }
    }

    /// Run a command silently, returning success/failure
    pub fn run_quiet(&self, cmd: &str, args: &[&str]) -> bool {
        self.command(cmd, args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_capture_trims_output() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(dir.path(), Vec::new());
        assert_eq!(runner.run_capture("echo", &["  hi  "]).unwrap(), "hi");
    }

    #[test]
    fn test_env_overlay_reaches_child() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(
            dir.path(),
            vec![("SKELKIT_TEST_VALUE".to_string(), "42".to_string())],
        );
        let out = runner
            .run_capture("sh", &["-c", "printf %s \"$SKELKIT_TEST_VALUE\""])
            .unwrap();
        assert_eq!(out, "42");
    }

    #[test]
    fn test_runs_in_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        let runner = Runner::new(dir.path(), Vec::new());
        assert!(runner.run_quiet("test", &["-f", "marker.txt"]));
        assert!(!runner.run_quiet("test", &["-f", "missing.txt"]));
    }

    #[test]
    fn test_failure_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(dir.path(), Vec::new());
        let err = runner
            .run_capture("sh", &["-c", "echo boom >&2; exit 3"])
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}

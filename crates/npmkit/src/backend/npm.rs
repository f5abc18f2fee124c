//! Real npm CLI backend.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::Permission;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

/// Backend that executes real `npm` commands.
///
/// Credentials reach npm only through the environment given to
/// [`NpmBackend::env`]; the parent process environment is left untouched.
pub struct NpmBackend {
    /// Path or name of the npm executable
    program: String,
    /// Package directory every command runs in
    cwd: PathBuf,
    /// Extra environment for each child process
    env: Vec<(String, String)>,
}

impl NpmBackend {
    /// Create a backend running `npm` in `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: "npm".to_string(),
            cwd: cwd.into(),
            env: Vec::new(),
        }
    }

    /// Use a specific npm executable.
    #[must_use]
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Add environment variables passed to every npm invocation.
    #[must_use]
    pub fn env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args).current_dir(&self.cwd);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }

    fn spawn_error(&self, err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::NotFound {
            Error::NpmNotFound
        } else {
            Error::CommandFailed {
                message: format!("failed to execute {}: {err}", self.program),
                stderr: String::new(),
            }
        }
    }

    /// Run npm quietly and return stdout.
    fn run_capture(&self, args: &[&str]) -> Result<String> {
        log::debug!("npm {}", args.join(" "));
        let output: Output = self
            .command(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
            text.push('\n');
            text.push_str(&String::from_utf8_lossy(&output.stdout));
            return Err(Error::from_npm_output(&text, args.first().copied().unwrap_or("")));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run npm with inherited stdio.
    fn run_inherit(&self, args: &[&str]) -> Result<()> {
        log::debug!("npm {}", args.join(" "));
        let status = self
            .command(args)
            .status()
            .map_err(|e| self.spawn_error(e))?;

        if !status.success() {
            return Err(Error::CommandFailed {
                message: format!("npm {} exited with {status}", args.join(" ")),
                stderr: String::new(),
            });
        }
        Ok(())
    }
}

impl Backend for NpmBackend {
    fn is_available(&self) -> bool {
        self.run_capture(&["--version"]).is_ok()
    }

    fn org_members(&self, scope: &str) -> Result<String> {
        self.run_capture(&["org", "ls", scope, "--json"])
    }

    fn org_teams(&self, scope: &str) -> Result<String> {
        self.run_capture(&["team", "ls", scope, "--json"])
    }

    fn grant(&self, permission: Permission, team: &str) -> Result<()> {
        self.run_capture(&["access", "grant", permission.as_str(), team])?;
        Ok(())
    }

    fn revoke(&self, team: &str) -> Result<()> {
        self.run_capture(&["access", "revoke", team])?;
        Ok(())
    }

    fn registry(&self) -> Result<String> {
        Ok(self
            .run_capture(&["config", "get", "registry"])?
            .trim()
            .to_string())
    }

    fn owners(&self) -> Result<Vec<String>> {
        let output = self.run_capture(&["author", "ls"])?;
        Ok(parse_owner_lines(&output))
    }

    fn publish(&self) -> Result<()> {
        self.run_inherit(&["publish"])
    }

    fn install(&self) -> Result<()> {
        self.run_inherit(&["install"])
    }

    fn clean_install(&self) -> Result<()> {
        self.run_inherit(&["ci"])
    }

    fn update(&self) -> Result<()> {
        self.run_inherit(&["update", "--save"])
    }
}

/// Parse `npm author ls` lines (`user <email>`) into user names.
fn parse_owner_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|l| l.split_whitespace().next())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_owner_lines() {
        let owners = parse_owner_lines("alice <alice@example.com>\nbob <bob@example.com>\n\n");
        assert_eq!(owners, vec!["alice", "bob"]);
    }

    #[test]
    fn test_missing_program_is_npm_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = NpmBackend::new(dir.path()).program("definitely-not-npm-xyz");
        assert!(!backend.is_available());
        assert!(matches!(backend.registry(), Err(Error::NpmNotFound)));
    }

    #[test]
    fn test_env_is_accumulated() {
        let backend = NpmBackend::new(".")
            .env([("NPM_TOKEN", "t1")])
            .env(vec![("GH_TOKEN".to_string(), "t2".to_string())]);
        assert_eq!(backend.env.len(), 2);
        assert_eq!(backend.env[0], ("NPM_TOKEN".to_string(), "t1".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_command_is_classified() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("npm");
        std::fs::write(
            &script,
            "#!/bin/sh\necho 'npm ERR! code E403' >&2\necho 'npm ERR! 403 Forbidden' >&2\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let backend = NpmBackend::new(dir.path()).program(script.to_string_lossy());
        let err = backend.org_members("@acme").unwrap_err();
        assert!(err.is_permission_denied());
    }
}

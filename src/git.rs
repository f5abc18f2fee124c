//! Git operations on the project repository.

use crate::runner::Runner;
use anyhow::Result;
use hubkit::RepoRef;
use regex::RegexBuilder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Not currently on any git branch")]
    DetachedHead,

    #[error("Repo does not have a GitHub origin: `{0}`")]
    NoGitHubOrigin(String),

    #[error("Package version is empty")]
    EmptyVersion,
}

/// Suffix every automated commit and tag message carries.
pub fn robotic(message: &str) -> String {
    if message.ends_with(']') {
        format!("{message}[robotic]")
    } else {
        format!("{message} [robotic]")
    }
}

/// Parse a GitHub remote URL (https or ssh) into `owner/repo`.
pub fn parse_github_origin(url: &str) -> std::result::Result<RepoRef, GitError> {
    const PATTERNS: [&str; 2] = [
        r"^https?://github\.com/([^/]+)/([^/]+?)(?:\.git)?$",
        r"^git@github(?:\.com)?:([^/]+)/([^/]+?)(?:\.git)?$",
    ];

    let url = url.trim();
    PATTERNS
        .iter()
        .filter_map(|p| RegexBuilder::new(p).case_insensitive(true).build().ok())
        .find_map(|re| {
            re.captures(url)
                .map(|c| RepoRef::new(&c[1], &c[2]))
        })
        .ok_or_else(|| GitError::NoGitHubOrigin(url.to_string()))
}

pub struct Git {
    runner: Runner,
}

impl Git {
    pub fn new(runner: Runner) -> Self {
        Self { runner }
    }

    pub fn is_repo(&self) -> bool {
        self.runner
            .run_capture("git", &["rev-parse", "--is-inside-work-tree"])
            .is_ok_and(|out| out == "true")
    }

    pub fn status(&self, short: bool) -> Result<String> {
        let mut args = vec!["status"];
        if short {
            args.push("--short");
        }
        args.push("--porcelain");
        self.runner.run_capture("git", &args)
    }

    pub fn is_dirty(&self) -> Result<bool> {
        Ok(!self.status(true)?.is_empty())
    }

    /// Current branch; an error when on a tag or a detached commit.
    pub fn current_branch(&self) -> Result<String> {
        let branch = self
            .runner
            .run_capture("git", &["symbolic-ref", "--short", "--quiet", "HEAD"])
            .map_err(|_| GitError::DetachedHead)?;
        if branch.is_empty() {
            return Err(GitError::DetachedHead.into());
        }
        Ok(branch)
    }

    pub fn github_origin(&self) -> Result<RepoRef> {
        let url = self
            .runner
            .run_capture("git", &["remote", "get-url", "origin"])
            .map_err(|_| GitError::NoGitHubOrigin(String::new()))?;
        Ok(parse_github_origin(&url)?)
    }

    pub fn has_github_origin(&self) -> bool {
        self.github_origin().is_ok()
    }

    /// Stage everything and commit.
    pub fn add_commit(&self, message: &str) -> Result<()> {
        self.runner.run("git", &["add", "--all"])?;
        self.runner
            .run("git", &["commit", "--message", &robotic(message)])
    }

    /// Annotated `v<version>` tag.
    pub fn tag(&self, version: &str, message: &str) -> Result<()> {
        if version.is_empty() {
            return Err(GitError::EmptyVersion.into());
        }
        let tag = format!("v{version}");
        self.runner.run(
            "git",
            &["tag", "--annotate", &tag, "--message", &robotic(message)],
        )
    }

    /// Push the current branch (setting upstream), then all tags.
    pub fn push(&self) -> Result<()> {
        let branch = self.current_branch()?;
        self.runner
            .run("git", &["push", "--set-upstream", "origin", &branch])?;
        self.runner.run("git", &["push", "origin", "--tags"])
    }

    pub fn local_sha(&self, branch: &str) -> Result<String> {
        Ok(self
            .runner
            .run_capture("git", &["rev-parse", branch])?
            .to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robotic_suffix() {
        assert_eq!(robotic("Release v1.0.1"), "Release v1.0.1 [robotic]");
        assert_eq!(robotic("Update deps [skip ci]"), "Update deps [skip ci][robotic]");
    }

    #[test]
    fn test_parse_https_origin() {
        let repo = parse_github_origin("https://github.com/acme/skeleton.git").unwrap();
        assert_eq!(repo, RepoRef::new("acme", "skeleton"));
        let repo = parse_github_origin("https://github.com/acme/skeleton").unwrap();
        assert_eq!(repo.repo, "skeleton");
    }

    #[test]
    fn test_parse_ssh_origin() {
        let repo = parse_github_origin("git@github.com:acme/app.js.git\n").unwrap();
        assert_eq!(repo, RepoRef::new("acme", "app.js"));
        assert!(parse_github_origin("git@github:acme/app").is_ok());
    }

    #[test]
    fn test_non_github_origin() {
        let err = parse_github_origin("https://gitlab.com/acme/app.git").unwrap_err();
        assert!(matches!(err, GitError::NoGitHubOrigin(_)));
    }

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    #[test]
    fn test_repo_lifecycle() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(dir.path(), Vec::new());
        let git = Git::new(runner.clone());
        assert!(!git.is_repo());

        runner.run_capture("git", &["init", "--quiet", "--initial-branch=main"]).unwrap();
        runner.run_capture("git", &["config", "user.email", "dev@example.com"]).unwrap();
        runner.run_capture("git", &["config", "user.name", "Dev"]).unwrap();
        runner.run_capture("git", &["config", "commit.gpgsign", "false"]).unwrap();
        runner.run_capture("git", &["config", "tag.gpgsign", "false"]).unwrap();
        assert!(git.is_repo());
        assert!(!git.has_github_origin());

        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        assert!(git.is_dirty().unwrap());

        git.add_commit("Initial").unwrap();
        assert!(!git.is_dirty().unwrap());
        assert_eq!(git.current_branch().unwrap(), "main");

        let log = runner.run_capture("git", &["log", "-1", "--format=%s"]).unwrap();
        assert_eq!(log, "Initial [robotic]");

        git.tag("1.0.0", "Release").unwrap();
        let sha = git.local_sha("main").unwrap();
        assert_eq!(git.local_sha("v1.0.0^{commit}").unwrap(), sha);

        runner
            .run_capture("git", &["remote", "add", "origin", "git@github.com:acme/app.git"])
            .unwrap();
        assert_eq!(git.github_origin().unwrap(), RepoRef::new("acme", "app"));
        assert!(git.tag("", "x").is_err());
    }
}

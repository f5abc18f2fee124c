//! Runtime settings and fixed declaration versions.
//!
//! Everything a collaborator needs from the outside world (project location,
//! org, credentials) is collected here once and passed down explicitly.

use std::path::PathBuf;
#[cfg(test)]
use std::path::Path;

/// Bump when the GitHub repo standards change.
pub const GITHUB_CONFIG_VERSION: &str = "1.0.1";
/// Bump when the GitHub environments layout changes.
pub const GITHUB_ENVS_VERSION: &str = "1.0.0";
/// Bump when the npmjs package standards change.
pub const NPMJS_CONFIG_VERSION: &str = "1.0.0";

/// Manifest paths of the persisted markers and overrides.
pub mod keys {
    pub const GITHUB_CONFIG_VERSION: &[&str] = &["config", "c10n", "&", "github", "configVersion"];
    pub const GITHUB_ENVS_VERSION: &[&str] = &["config", "c10n", "&", "github", "envsVersion"];
    pub const NPMJS_CONFIG_VERSIONS: &[&str] = &["config", "c10n", "&", "npmjs", "configVersions"];
    pub const GITHUB_LABELS: &[&str] = &["config", "c10n", "&", "github", "labels"];
    pub const GITHUB_TEAMS: &[&str] = &["config", "c10n", "&", "github", "teams"];
    pub const NPMJS_TEAMS: &[&str] = &["config", "c10n", "&", "npmjs", "teams"];
    pub const BUILD_APP_TYPE: &[&str] = &["config", "c10n", "&", "build", "appType"];
}

/// Dotenv-vault decryption keys supplied for non-interactive installs.
#[derive(Debug, Clone, Default)]
pub struct DotenvKeys {
    pub main: Option<String>,
    pub dev: Option<String>,
    pub ci: Option<String>,
    pub stage: Option<String>,
    pub prod: Option<String>,
}

/// Settings threaded into every command.
#[derive(Debug, Clone)]
pub struct Settings {
    pub project_dir: PathBuf,
    /// GitHub organization login and npm scope (without `@`).
    pub org: String,
    pub github_token: Option<String>,
    pub npm_token: Option<String>,
    pub cloudflare_token: Option<String>,
    pub dotenv_keys: DotenvKeys,
}

impl Settings {
    pub fn package_json(&self) -> PathBuf {
        self.project_dir.join("package.json")
    }

    /// Archive produced by the build and attached to releases.
    pub fn dist_archive(&self) -> PathBuf {
        self.project_dir.join(".~dist.zip")
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.project_dir.join("dist")
    }

    pub fn env_vault(&self) -> PathBuf {
        self.project_dir.join(".env.vault")
    }

    /// npm scope of the configured org, e.g. `@acme`.
    pub fn npm_scope(&self) -> String {
        format!("@{}", self.org.trim_start_matches('@'))
    }

    /// Environment handed to child processes.
    ///
    /// Missing credentials are passed as empty strings so a stale value in the
    /// parent environment never leaks into a child.
    pub fn child_env(&self) -> Vec<(String, String)> {
        let github = self.github_token.clone().unwrap_or_default();
        vec![
            (
                "NPM_TOKEN".to_string(),
                self.npm_token.clone().unwrap_or_default(),
            ),
            ("GH_TOKEN".to_string(), github.clone()),
            ("GITHUB_TOKEN".to_string(), github),
            (
                "CLOUDFLARE_API_TOKEN".to_string(),
                self.cloudflare_token.clone().unwrap_or_default(),
            ),
        ]
    }

    pub fn github(&self) -> hubkit::GitHubClient {
        hubkit::GitHubClient::new(self.github_token.clone())
    }

    pub fn npm(&self) -> npmkit::Client {
        npmkit::Client::new(&self.project_dir, self.child_env())
    }
}

/// Whether a human is at the terminal.
///
/// `PARENT_IS_TTY` lets a wrapping script vouch for a terminal it owns.
pub fn is_interactive() -> bool {
    let tty = console::Term::stdout().is_term() || std::env::var_os("PARENT_IS_TTY").is_some();
    interactive_from(
        tty,
        std::env::var("TERM").ok().as_deref(),
        std::env::var("CI").ok().as_deref(),
    )
}

fn interactive_from(tty: bool, term: Option<&str>, ci: Option<&str>) -> bool {
    tty && term.is_some_and(|t| !t.is_empty() && t != "dumb") && ci != Some("true")
}

#[cfg(test)]
pub(crate) fn test_settings(project_dir: &Path) -> Settings {
    Settings {
        project_dir: project_dir.to_path_buf(),
        org: "acme".to_string(),
        github_token: Some("gh".to_string()),
        npm_token: None,
        cloudflare_token: None,
        dotenv_keys: DotenvKeys::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_env_blanks_missing_tokens() {
        let settings = test_settings(Path::new("/tmp/proj"));
        let env = settings.child_env();
        assert!(env.contains(&("GH_TOKEN".to_string(), "gh".to_string())));
        assert!(env.contains(&("GITHUB_TOKEN".to_string(), "gh".to_string())));
        assert!(env.contains(&("NPM_TOKEN".to_string(), String::new())));
    }

    #[test]
    fn test_npm_scope() {
        let mut settings = test_settings(Path::new("."));
        assert_eq!(settings.npm_scope(), "@acme");
        settings.org = "@acme".to_string();
        assert_eq!(settings.npm_scope(), "@acme");
    }

    #[test]
    fn test_paths() {
        let settings = test_settings(Path::new("/tmp/proj"));
        assert_eq!(settings.package_json(), Path::new("/tmp/proj/package.json"));
        assert_eq!(settings.dist_archive(), Path::new("/tmp/proj/.~dist.zip"));
    }

    #[test]
    fn test_interactive_detection() {
        assert!(interactive_from(true, Some("xterm-256color"), None));
        assert!(!interactive_from(false, Some("xterm"), None));
        assert!(!interactive_from(true, Some("dumb"), None));
        assert!(!interactive_from(true, None, None));
        assert!(!interactive_from(true, Some("xterm"), Some("true")));
        assert!(interactive_from(true, Some("xterm"), Some("false")));
    }
}

//! Dotenv Vault environments.
//!
//! The vault itself is driven through its CLI (`npx dotenv-vault ...`); this
//! module knows the env file layout, pulls decryption keys out of the CLI's
//! output, and renders decrypted variables back into env files.

use crate::runner::Runner;
use anyhow::{Context, Result, bail};
use regex::RegexBuilder;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// One of the project's env files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnvName {
    Main,
    Dev,
    Ci,
    Stage,
    Prod,
}

impl EnvName {
    pub const ALL: [Self; 5] = [Self::Main, Self::Dev, Self::Ci, Self::Stage, Self::Prod];

    /// Environments that exist as deployment environments at GitHub.
    pub const DEPLOYABLE: [Self; 4] = [Self::Dev, Self::Ci, Self::Stage, Self::Prod];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Dev => "dev",
            Self::Ci => "ci",
            Self::Stage => "stage",
            Self::Prod => "prod",
        }
    }

    /// Path of the env file relative to the project directory.
    pub fn relative_file(&self) -> &'static str {
        match self {
            Self::Main => "dev/.envs/.env",
            Self::Dev => "dev/.envs/.env.dev",
            Self::Ci => "dev/.envs/.env.ci",
            Self::Stage => "dev/.envs/.env.stage",
            Self::Prod => "dev/.envs/.env.prod",
        }
    }

    pub fn file(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(self.relative_file())
    }

    /// Name of the GitHub environment secret holding this env's key.
    pub fn secret_name(&self) -> String {
        format!("USER_DOTENV_KEY_{}", self.as_str().to_uppercase())
    }
}

impl fmt::Display for EnvName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .with_context(|| format!("Unknown env `{s}`"))
    }
}

// =============================================================================
// Keys
// =============================================================================

/// Extract the decryption key of every env from `dotenv-vault keys` output.
///
/// All five envs must be present.
pub fn extract_keys(output: &str) -> Result<BTreeMap<EnvName, String>> {
    let re = RegexBuilder::new(r"\bdotenv://:key_.+?\?environment=(\S+)")
        .case_insensitive(true)
        .build()?;

    let mut keys = BTreeMap::new();
    for caps in re.captures_iter(output) {
        if let Ok(env) = caps[1].parse::<EnvName>() {
            keys.insert(env, caps[0].to_string());
        }
    }

    if keys.len() != EnvName::ALL.len() {
        bail!(
            "Failed to extract Dotenv Vault keys (found {} of {})",
            keys.len(),
            EnvName::ALL.len()
        );
    }
    Ok(keys)
}

/// The env a decryption key belongs to, from its `?environment=` parameter.
pub fn env_of_key(key: &str) -> Result<EnvName> {
    key.split_once('?')
        .and_then(|(_, query)| query.split('&').find_map(|p| p.strip_prefix("environment=")))
        .and_then(|env| env.parse().ok())
        .with_context(|| format!("Invalid Dotenv Vault decryption key: `{key}`"))
}

// =============================================================================
// Env file rendering
// =============================================================================

/// Parse dotenv text into ordered variables.
pub fn parse_env(text: &str) -> Result<Vec<(String, String)>> {
    dotenvy::from_read_iter(text.as_bytes())
        .map(|item| item.context("Invalid env output"))
        .collect()
}

/// Render variables as an env file: a `# <env>` header, then one
/// double-quoted assignment per line.
pub fn env_to_string(env: EnvName, vars: &[(String, String)]) -> String {
    let mut out = format!("# {env}\n");
    for (name, value) in vars {
        let value = value
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .replace('\n', "\\n")
            .replace('"', "\\\"");
        out.push_str(&format!("{name}=\"{value}\"\n"));
    }
    out
}

// =============================================================================
// Vault CLI
// =============================================================================

pub struct Vault {
    runner: Runner,
}

impl Vault {
    pub fn new(runner: Runner) -> Self {
        Self { runner }
    }

    fn run(&self, args: &[&str]) -> Result<()> {
        let mut full = vec!["dotenv-vault"];
        full.extend_from_slice(args);
        self.runner.run("npx", &full)
    }

    fn capture(&self, args: &[&str]) -> Result<String> {
        let mut full = vec!["dotenv-vault"];
        full.extend_from_slice(args);
        self.runner.run_capture("npx", &full)
    }

    pub fn push(&self, env: EnvName, file: &Path) -> Result<()> {
        self.run(&["push", env.as_str(), &file.to_string_lossy(), "--yes"])
    }

    pub fn pull(&self, env: EnvName, file: &Path) -> Result<()> {
        self.run(&["pull", env.as_str(), &file.to_string_lossy(), "--yes"])
    }

    /// Encrypt all envs into `.env.vault`.
    pub fn build(&self) -> Result<()> {
        self.run(&["build", "--yes"])
    }

    /// Print the keys to the terminal.
    pub fn show_keys(&self) -> Result<()> {
        self.run(&["keys", "--yes"])
    }

    /// Fetch and extract all five keys.
    pub fn keys(&self) -> Result<BTreeMap<EnvName, String>> {
        extract_keys(&self.capture(&["keys", "--yes"])?)
    }

    /// Decrypt the env that `key` unlocks from the local `.env.vault`.
    pub fn decrypt(&self, key: &str) -> Result<Vec<(String, String)>> {
        parse_env(&self.capture(&["decrypt", key])?)
    }
}

use crate::config::{DotenvKeys, Settings};
use crate::vault::EnvName;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skelkit")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Project chores for skeleton-based repos: envs, org standards, releases", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Project location, org and credentials.
#[derive(Args)]
pub struct SettingsArgs {
    /// Project directory (where `package.json` lives)
    #[arg(long, env = "SKELKIT_PROJECT_DIR", default_value = ".", global = true)]
    pub project_dir: PathBuf,

    /// GitHub organization and npm scope
    #[arg(long, env = "SKELKIT_ORG", default_value = "clevercanyon", global = true)]
    pub org: String,

    #[arg(long, env = "USER_GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub github_token: Option<String>,

    #[arg(long, env = "USER_NPM_TOKEN", hide_env_values = true, global = true)]
    pub npm_token: Option<String>,

    #[arg(long, env = "USER_CLOUDFLARE_TOKEN", hide_env_values = true, global = true)]
    pub cloudflare_token: Option<String>,

    #[arg(long, env = "USER_DOTENV_KEY_MAIN", hide = true, global = true)]
    pub dotenv_key_main: Option<String>,

    #[arg(long, env = "USER_DOTENV_KEY_DEV", hide = true, global = true)]
    pub dotenv_key_dev: Option<String>,

    #[arg(long, env = "USER_DOTENV_KEY_CI", hide = true, global = true)]
    pub dotenv_key_ci: Option<String>,

    #[arg(long, env = "USER_DOTENV_KEY_STAGE", hide = true, global = true)]
    pub dotenv_key_stage: Option<String>,

    #[arg(long, env = "USER_DOTENV_KEY_PROD", hide = true, global = true)]
    pub dotenv_key_prod: Option<String>,
}

impl SettingsArgs {
    pub fn into_settings(self) -> Settings {
        Settings {
            project_dir: self.project_dir,
            org: self.org,
            github_token: self.github_token,
            npm_token: self.npm_token,
            cloudflare_token: self.cloudflare_token,
            dotenv_keys: DotenvKeys {
                main: self.dotenv_key_main,
                dev: self.dotenv_key_dev,
                ci: self.dotenv_key_ci,
                stage: self.dotenv_key_stage,
                prod: self.dotenv_key_prod,
            },
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage env files stored in Dotenv Vault
    #[command(subcommand)]
    Envs(EnvsCommand),

    /// Apply org-wide standards to the GitHub repo and npm package
    #[command(subcommand)]
    Standards(StandardsCommand),

    /// Manage the package version
    #[command(subcommand)]
    Version(VersionCommand),

    /// Bump, tag, push and publish a release
    Release(ReleaseArgs),

    /// Build the project with Vite
    Build(BuildArgs),

    /// Manage npm dependencies
    #[command(subcommand)]
    Deps(DepsCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Envs
// ============================================================================

#[derive(Subcommand)]
pub enum EnvsCommand {
    /// Push every env file to the vault, then rebuild `.env.vault`
    Push {
        #[arg(long)]
        dry_run: bool,
    },

    /// Pull every env file from the vault
    Pull {
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the vault decryption keys
    Keys {
        #[arg(long)]
        dry_run: bool,
    },

    /// Encrypt all envs into `.env.vault`
    Encrypt {
        #[arg(long)]
        dry_run: bool,
    },

    /// Decrypt envs from `.env.vault` into their env files
    Decrypt {
        /// Decryption keys (`dotenv://:key_...?environment=<env>`)
        #[arg(long, num_args = 1.., required = true)]
        keys: Vec<String>,

        #[arg(long)]
        dry_run: bool,
    },

    /// Install env files for a mode
    Install {
        #[arg(long, value_enum, default_value = "prod")]
        mode: Mode,

        #[arg(long)]
        dry_run: bool,
    },
}

// ============================================================================
// Standards
// ============================================================================

#[derive(Subcommand)]
pub enum StandardsCommand {
    /// Repo settings, labels, teams and branch protection
    Github {
        #[arg(long)]
        dry_run: bool,
    },

    /// Deployment environments, branch policies and env secrets
    Envs {
        #[arg(long)]
        dry_run: bool,
    },

    /// npm team access for the package
    Npmjs {
        #[arg(long)]
        dry_run: bool,
    },

    /// Everything above, in order
    All {
        #[arg(long)]
        dry_run: bool,
    },
}

// ============================================================================
// Version, release, build, deps
// ============================================================================

#[derive(Subcommand)]
pub enum VersionCommand {
    /// Increment the version in `package.json`
    Bump {
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Parser)]
pub struct ReleaseArgs {
    #[arg(long, value_enum, default_value = "prod")]
    pub mode: Mode,

    /// Commit and tag message (default: `Release v<version>.`)
    #[arg(short, long)]
    pub message: Option<String>,

    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct BuildArgs {
    #[arg(long, value_enum, default_value = "prod")]
    pub mode: Mode,

    /// App type (default: `config.c10n.&.build.appType` in `package.json`)
    #[arg(long, value_enum)]
    pub app_type: Option<AppType>,
}

#[derive(Subcommand)]
pub enum DepsCommand {
    /// `npm install`
    Install,
    /// `npm ci`
    Ci,
    /// `npm update`, then reformat `package.json`
    Update,
}

// ============================================================================
// Value enums
// ============================================================================

/// Build and deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Dev,
    Ci,
    Stage,
    Prod,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        self.env().as_str()
    }

    /// Env file loaded in this mode.
    pub fn env(self) -> EnvName {
        match self {
            Self::Dev => EnvName::Dev,
            Self::Ci => EnvName::Ci,
            Self::Stage => EnvName::Stage,
            Self::Prod => EnvName::Prod,
        }
    }
}

/// Kind of project being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AppType {
    /// Single-page app
    Spa,
    /// Multi-page app
    Mpa,
    /// Custom multi-entry app
    Cma,
    /// Library
    Lib,
}

impl AppType {
    /// Whether the build deploys to Cloudflare Pages through wrangler.
    pub fn is_pages_app(self) -> bool {
        matches!(self, Self::Spa | Self::Mpa)
    }
}

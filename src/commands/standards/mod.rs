//! Org-wide standards applied to a project's GitHub repo and npm package.
//!
//! Each pass is versioned: once it completes, its declaration version is
//! recorded in `package.json` and the pass is skipped until the version
//! changes. Dry runs never record a version.

pub mod envs;
pub mod github;
pub mod npmjs;

use anyhow::{Context, Result};
use declarative::should_skip;
use hubkit::{GitHubClient, RepoRef, Repository};
use serde_json::Value;

use crate::Context as AppContext;
use crate::cli::StandardsCommand;
use crate::git::Git;
use crate::manifest::Manifest;

pub fn run(ctx: &AppContext, cmd: StandardsCommand) -> Result<()> {
    match cmd {
        StandardsCommand::Github { dry_run } => github::run(ctx, dry_run),
        StandardsCommand::Envs { dry_run } => envs::run(ctx, dry_run),
        StandardsCommand::Npmjs { dry_run } => npmjs::run(ctx, dry_run),
        StandardsCommand::All { dry_run } => {
            github::run(ctx, dry_run)?;
            envs::run(ctx, dry_run)?;
            npmjs::run(ctx, dry_run)
        }
    }
}

/// `owner/repo` of the project's GitHub origin.
pub(crate) fn origin(ctx: &AppContext) -> Result<RepoRef> {
    Git::new(ctx.runner()).github_origin()
}

/// Fetch the repo and check that it belongs to `org` and that the caller
/// administers it. `None` means the repo is not ours to configure.
pub(crate) fn admin_repo(
    client: &GitHubClient,
    repo: &RepoRef,
    org: &str,
) -> Result<Option<Repository>> {
    let info = match client.repository(repo) {
        Ok(info) => info,
        Err(err) if err.is_permission_denied() => {
            log::debug!("{repo}: {err}");
            return Ok(None);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to fetch GitHub repo `{repo}`"));
        }
    };

    if !info.is_owned_by_org(org) {
        log::debug!("{repo} is not an `{org}` org repo");
        return Ok(None);
    }
    if !info.can_admin() {
        log::debug!("{repo}: admin permission required");
        return Ok(None);
    }
    Ok(Some(info))
}

/// Whether the version recorded at `keys` already matches.
pub(crate) fn is_current(manifest: &Manifest, keys: &[&str], version: &str) -> bool {
    should_skip(manifest.get_str(keys), version)
}

/// Record a completed pass; nothing is written in a dry run.
pub(crate) fn record(
    manifest: &mut Manifest,
    keys: &[&str],
    version: &str,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        return Ok(());
    }
    manifest.set(keys, Value::String(version.to_string()));
    manifest.save()
}

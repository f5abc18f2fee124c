//! Cut a release: bump, tag, push, publish.

use anyhow::{Context, Result, bail};
use hubkit::{GitHubClient, NewRelease, RepoRef};
use std::path::Path;

use crate::Context as AppContext;
use crate::cli::{Mode, ReleaseArgs};
use crate::commands::{standards, version};
use crate::git::Git;
use crate::manifest::Manifest;
use crate::ui;
use crate::version::is_prerelease;

pub fn run(ctx: &AppContext, args: ReleaseArgs) -> Result<()> {
    let dry_run = args.dry_run;
    let archive = ctx.settings.dist_archive();
    if !archive.is_file() {
        bail!("Missing `{}`; build the project first", archive.display());
    }

    let git = Git::new(ctx.runner());
    let repo = git.github_origin()?;
    let branch = git.current_branch()?;
    let mut manifest = Manifest::load(&ctx.settings.package_json())?;

    let next = version::bump(ctx, &mut manifest, dry_run)?;
    let message = args
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Release v{next}."));

    ctx.step(&format!("Committing, tagging and pushing `v{next}`."));
    if !dry_run {
        git.add_commit(&message)?;
        git.tag(&next, &message)?;
        git.push()?;
    }

    github_release(ctx, &ctx.settings.github(), &repo, &next, &archive, dry_run)?;

    if is_publishable(&manifest, &branch, args.mode) {
        let npm = ctx.settings.npm();
        ctx.step("Publishing package to npm.");
        if !dry_run {
            npm.publish().context("npm publish failed")?;
        }
        if npm.is_published_at_npmjs(manifest.name()) {
            standards::npmjs::configure(ctx, &npm, &mut manifest, dry_run)?;
        }
    }

    if !ctx.quiet {
        ui::success(&format!("Released v{next}"));
    }
    Ok(())
}

/// Public packages publish from `main` in prod mode only.
fn is_publishable(manifest: &Manifest, branch: &str, mode: Mode) -> bool {
    !manifest.is_private() && branch == "main" && mode == Mode::Prod
}

/// Create the `v<version>` release and attach the dist archive as `dist.zip`.
fn github_release(
    ctx: &AppContext,
    client: &GitHubClient,
    repo: &RepoRef,
    version: &str,
    archive: &Path,
    dry_run: bool,
) -> Result<()> {
    let tag = format!("v{version}");
    ctx.step(&format!("Creating `{tag}` release at GitHub."));
    if dry_run {
        return Ok(());
    }

    let release = client
        .create_release(
            repo,
            &NewRelease {
                name: tag.clone(),
                tag_name: tag.clone(),
                draft: false,
                generate_release_notes: true,
                prerelease: is_prerelease(version),
            },
        )
        .with_context(|| format!("Failed to create `{tag}` release"))?;
    if let Some(url) = &release.html_url {
        log::info!("Release: {url}");
    }

    client
        .upload_release_asset(&release, "dist.zip", archive)
        .with_context(|| format!("Failed to upload dist.zip to `{tag}` release"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::standards::testing::write_manifest;
    use crate::config::test_settings;
    use mockito::Matcher;
    use std::fs;

    fn context(dir: &Path) -> AppContext {
        AppContext {
            quiet: true,
            settings: test_settings(dir),
        }
    }

    #[test]
    fn test_is_publishable() {
        let dir = tempfile::tempdir().unwrap();
        let public = Manifest::load(&write_manifest(dir.path(), r#"{"name": "@acme/app"}"#)).unwrap();
        assert!(is_publishable(&public, "main", Mode::Prod));
        assert!(!is_publishable(&public, "dev", Mode::Prod));
        assert!(!is_publishable(&public, "main", Mode::Stage));

        let private = Manifest::load(&write_manifest(dir.path(), r#"{"private": true}"#)).unwrap();
        assert!(!is_publishable(&private, "main", Mode::Prod));
    }

    #[test]
    fn test_github_release_uploads_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join(".~dist.zip");
        fs::write(&archive, "PK").unwrap();

        let mut server = mockito::Server::new();
        let upload_url = format!("{}/uploads/releases/9/assets{{?name,label}}", server.url());
        let create = server
            .mock("POST", "/repos/acme/app/releases")
            .match_body(Matcher::PartialJsonString(
                r#"{"name": "v1.0.0-beta.2", "tag_name": "v1.0.0-beta.2", "prerelease": true, "draft": false}"#
                    .to_string(),
            ))
            .with_status(201)
            .with_body(format!(r#"{{"id": 9, "upload_url": "{upload_url}"}}"#))
            .create();
        let upload = server
            .mock("POST", "/uploads/releases/9/assets")
            .match_query(Matcher::UrlEncoded("name".into(), "dist.zip".into()))
            .match_body("PK")
            .with_status(201)
            .create();

        let client = GitHubClient::with_api_base(server.url(), Some("t0ken".to_string()));
        github_release(
            &context(dir.path()),
            &client,
            &RepoRef::new("acme", "app"),
            "1.0.0-beta.2",
            &archive,
            false,
        )
        .unwrap();

        create.assert();
        upload.assert();
    }

    #[test]
    fn test_release_requires_archive() {
        let dir = tempfile::tempdir().unwrap();
        let args = ReleaseArgs {
            mode: Mode::Prod,
            message: None,
            dry_run: true,
        };
        let err = run(&context(dir.path()), args).unwrap_err();
        assert!(err.to_string().contains(".~dist.zip"));
    }
}

//! Vite builds (`build`).

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use std::fs;
use std::path::Path;

use crate::Context as AppContext;
use crate::cli::{AppType, BuildArgs};
use crate::config::keys;
use crate::manifest::Manifest;

/// Wrangler's cache, relative to the dist directory.
const WRANGLER_CACHE: &str = "node_modules/.cache/wrangler";

pub fn run(ctx: &AppContext, args: BuildArgs) -> Result<()> {
    let app_type = match args.app_type {
        Some(app_type) => Some(app_type),
        None => declared_app_type(&Manifest::load(&ctx.settings.package_json())?)?,
    };
    let keep_cache = app_type.is_some_and(AppType::is_pages_app);

    ctx.step("Resetting dist directory.");
    reset_dist(&ctx.settings.project_dir, &ctx.settings.dist_dir(), keep_cache)?;

    ctx.step(&format!("Building for `{}` mode.", args.mode.as_str()));
    ctx.runner()
        .run("npx", &["vite", "build", "--mode", args.mode.as_str()])
}

/// App type declared in `package.json`, if any.
fn declared_app_type(manifest: &Manifest) -> Result<Option<AppType>> {
    manifest
        .get_str(keys::BUILD_APP_TYPE)
        .map(|value| {
            AppType::from_str(value, true)
                .map_err(|_| anyhow!("Unknown app type `{value}` in package.json"))
        })
        .transpose()
}

/// Empty `dist`, carrying wrangler's cache over when asked to.
fn reset_dist(project_dir: &Path, dist: &Path, keep_cache: bool) -> Result<()> {
    let cache = dist.join(WRANGLER_CACHE);
    let stash = project_dir.join(format!(".~c10n-wrangler-{}", std::process::id()));

    let stashed = keep_cache && cache.is_dir();
    if stashed {
        fs::rename(&cache, &stash)
            .with_context(|| format!("Failed to move {}", cache.display()))?;
    }

    if dist.exists() {
        fs::remove_dir_all(dist).with_context(|| format!("Failed to remove {}", dist.display()))?;
    }
    fs::create_dir_all(dist).with_context(|| format!("Failed to create {}", dist.display()))?;

    if stashed {
        if let Some(parent) = cache.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::rename(&stash, &cache)
            .with_context(|| format!("Failed to restore {}", cache.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::standards::testing::write_manifest;

    fn populate(dist: &Path) {
        fs::create_dir_all(dist.join(WRANGLER_CACHE)).unwrap();
        fs::write(dist.join(WRANGLER_CACHE).join("state.json"), "{}").unwrap();
        fs::write(dist.join("index.html"), "<html>").unwrap();
    }

    #[test]
    fn test_reset_keeps_wrangler_cache() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path().join("dist");
        populate(&dist);

        reset_dist(dir.path(), &dist, true).unwrap();

        assert!(!dist.join("index.html").exists());
        assert!(dist.join(WRANGLER_CACHE).join("state.json").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_reset_drops_everything_for_libraries() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path().join("dist");
        populate(&dist);

        reset_dist(dir.path(), &dist, false).unwrap();
        assert_eq!(fs::read_dir(&dist).unwrap().count(), 0);
    }

    #[test]
    fn test_reset_creates_missing_dist() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path().join("dist");
        reset_dist(dir.path(), &dist, true).unwrap();
        assert!(dist.is_dir());
    }

    #[test]
    fn test_declared_app_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(
            dir.path(),
            r#"{"config": {"c10n": {"&": {"build": {"appType": "SPA"}}}}}"#,
        );
        assert_eq!(
            declared_app_type(&Manifest::load(&path).unwrap()).unwrap(),
            Some(AppType::Spa)
        );

        let path = write_manifest(dir.path(), "{}");
        assert_eq!(declared_app_type(&Manifest::load(&path).unwrap()).unwrap(), None);

        let path = write_manifest(
            dir.path(),
            r#"{"config": {"c10n": {"&": {"build": {"appType": "desktop"}}}}}"#,
        );
        assert!(declared_app_type(&Manifest::load(&path).unwrap()).is_err());
    }
}

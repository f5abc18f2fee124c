use anyhow::Result;

use crate::Context as AppContext;
use crate::cli::VersionCommand;
use crate::manifest::Manifest;
use crate::version::increment;

pub fn run(ctx: &AppContext, cmd: VersionCommand) -> Result<()> {
    match cmd {
        VersionCommand::Bump { dry_run } => {
            let mut manifest = Manifest::load(&ctx.settings.package_json())?;
            bump(ctx, &mut manifest, dry_run)?;
            Ok(())
        }
    }
}

/// Increment the package version; returns the new version. A dry run only
/// computes it.
pub(crate) fn bump(ctx: &AppContext, manifest: &mut Manifest, dry_run: bool) -> Result<String> {
    let next = increment(manifest.version())?;
    ctx.step(&format!(
        "Bumping package version from `{}` to `{next}`.",
        manifest.version()
    ));
    if !dry_run {
        manifest.set_version(&next);
        manifest.save()?;
    }
    Ok(next)
}

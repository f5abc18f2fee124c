use anyhow::Result;

use crate::Context as AppContext;
use crate::cli::DepsCommand;
use crate::manifest;

pub fn run(ctx: &AppContext, cmd: DepsCommand) -> Result<()> {
    run_with(ctx, &ctx.settings.npm(), cmd)
}

fn run_with(ctx: &AppContext, npm: &npmkit::Client, cmd: DepsCommand) -> Result<()> {
    match cmd {
        DepsCommand::Install => {
            ctx.step("Installing npm dependencies.");
            npm.install()?;
        }
        DepsCommand::Ci => {
            ctx.step("Installing npm dependencies from the lockfile.");
            npm.clean_install()?;
        }
        DepsCommand::Update => {
            ctx.step("Updating npm dependencies.");
            npm.update()?;
            manifest::prettify(&ctx.settings.package_json())?;
        }
    }
    Ok(())
}

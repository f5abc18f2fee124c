mod cli;
mod commands;
mod config;
mod git;
mod manifest;
mod runner;
mod ui;
mod vault;
mod version;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Settings;
use runner::Runner;
use std::io;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    pub settings: Settings,
}

impl Context {
    /// Process runner in the project directory, carrying the credentials.
    pub fn runner(&self) -> Runner {
        Runner::new(&self.settings.project_dir, self.settings.child_env())
    }

    pub fn reporter(&self) -> ui::Reporter {
        ui::Reporter::new(self.quiet)
    }

    /// Print a progress line unless `--quiet`.
    pub fn step(&self, msg: &str) {
        if !self.quiet {
            ui::dim(msg);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        quiet: cli.quiet,
        settings: cli.settings.into_settings(),
    };

    match cli.command {
        Command::Envs(cmd) => commands::envs::run(&ctx, cmd),
        Command::Standards(cmd) => commands::standards::run(&ctx, cmd),
        Command::Version(cmd) => commands::version::run(&ctx, cmd),
        Command::Release(args) => commands::release::run(&ctx, args),
        Command::Build(args) => commands::build::run(&ctx, args),
        Command::Deps(cmd) => commands::deps::run(&ctx, cmd),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "skelkit", &mut io::stdout());
            Ok(())
        }
    }
}

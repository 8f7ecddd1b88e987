//! ran - search the shell commands Claude Code has run

mod cli;
mod commands;
mod logging;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use ran_db::HistoryDb;
use tracing::debug;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    if !atty::is(atty::Stream::Stdout) {
        colored::control::set_override(false);
    }

    match &cli.command {
        Command::Search {
            pattern,
            regex,
            cwd,
            limit,
            no_sync,
        } => commands::search::run(
            &cli,
            &open_db(&cli)?,
            pattern,
            *regex,
            cwd.as_deref(),
            *limit,
            *no_sync,
        ),

        Command::List { limit, no_sync } => {
            commands::list::run(&cli, &open_db(&cli)?, *limit, *no_sync)
        }

        Command::Sync { rebuild } => commands::sync::run(&cli, &open_db(&cli)?, *rebuild),

        Command::Stats => commands::stats::run(&cli, &open_db(&cli)?),

        // Onboarding never touches the store
        Command::Onboard { force } => commands::onboard::run(*force),
    }
}

fn open_db(cli: &Cli) -> Result<HistoryDb> {
    let path = cli.db_path.clone().unwrap_or_else(ran_db::default_db_path);
    debug!("opening store at {}", path.display());
    HistoryDb::open(&path).context("failed to open command history")
}

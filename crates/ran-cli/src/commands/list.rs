//! List command - show the most recent commands

use anyhow::Result;
use ran_db::HistoryDb;
use ran_indexer::SyncOptions;

use crate::cli::{Cli, OutputFormat};
use crate::commands::sync;
use crate::output::{colors, human, json};

pub fn run(cli: &Cli, db: &HistoryDb, limit: usize, no_sync: bool) -> Result<()> {
    if !no_sync {
        sync::sync(cli, db, &SyncOptions::default())?;
    }

    let commands = db.list_commands(limit)?;

    match cli.effective_format() {
        OutputFormat::Human => {
            if commands.is_empty() {
                println!("No commands in history.");
            } else {
                println!(
                    "{}",
                    colors::header(&format!("Last {} command(s)", commands.len()))
                );
                println!();
                for cmd in &commands {
                    println!("{}", human::format_command(cmd));
                    println!();
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", json::to_string(&commands, cli.pretty)?);
        }
    }

    Ok(())
}

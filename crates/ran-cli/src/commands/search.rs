//! Search command - find commands by substring or regex

use anyhow::Result;
use colored::Colorize;
use ran_db::{HistoryDb, SearchQuery};
use ran_indexer::SyncOptions;
use serde_json::json;

use crate::cli::{Cli, OutputFormat};
use crate::commands::sync;
use crate::output::{colors, human, json};

pub fn run(
    cli: &Cli,
    db: &HistoryDb,
    pattern: &str,
    regex: bool,
    cwd: Option<&str>,
    limit: Option<usize>,
    no_sync: bool,
) -> Result<()> {
    if !no_sync {
        sync::sync(cli, db, &SyncOptions::default())?;
    }

    let mut query = SearchQuery::new(pattern).with_regex(regex);
    if let Some(cwd) = cwd {
        query = query.in_cwd(cwd);
    }
    if let Some(limit) = limit {
        query = query.with_limit(limit);
    }

    let results = db.search_commands(&query)?;

    match cli.effective_format() {
        OutputFormat::Human => {
            if results.commands.is_empty() {
                println!("No commands found matching: {}", pattern.cyan());
                return Ok(());
            }

            let mut title = format!("Found {} command(s)", results.total);
            if results.is_truncated() {
                title.push_str(&format!(" (showing {})", results.commands.len()));
            }
            println!("{}", colors::header(&title));
            println!();

            for cmd in &results.commands {
                println!("{}", human::format_command(cmd));
                println!();
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "total": results.total,
                "commands": results.commands,
            });
            println!("{}", json::to_string(&output, cli.pretty)?);
        }
    }

    Ok(())
}

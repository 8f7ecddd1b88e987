//! Stats command - store totals

use anyhow::Result;
use ran_db::HistoryDb;
use serde_json::json;

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, json};

pub fn run(cli: &Cli, db: &HistoryDb) -> Result<()> {
    let stats = db.stats()?;

    match cli.effective_format() {
        OutputFormat::Human => {
            println!("{}", colors::header("Command History"));
            println!();
            if let Some(path) = &stats.db_path {
                println!("  {}: {}", colors::label("Database"), path.display());
            }
            println!(
                "  {}: {}",
                colors::label("Size"),
                colors::format_size(stats.db_size_bytes)
            );
            println!();
            println!(
                "  {}: {}",
                colors::label("Commands"),
                colors::value(&colors::format_count(stats.total_commands))
            );
            println!(
                "  {}: {}",
                colors::label("Indexed files"),
                colors::value(&colors::format_count(stats.indexed_files))
            );
        }
        OutputFormat::Json => {
            let output = json!({
                "total_commands": stats.total_commands,
                "indexed_files": stats.indexed_files,
                "db_path": stats.db_path,
                "db_size_bytes": stats.db_size_bytes,
            });
            println!("{}", json::to_string(&output, cli.pretty)?);
        }
    }

    Ok(())
}

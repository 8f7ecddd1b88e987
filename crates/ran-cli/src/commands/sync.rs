//! Sync command - index new transcript content

use anyhow::{Context, Result};
use ran_db::HistoryDb;
use ran_indexer::{SyncOptions, SyncReport};
use serde_json::json;

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, json};

pub fn run(cli: &Cli, db: &HistoryDb, rebuild: bool) -> Result<()> {
    let report = sync(cli, db, &SyncOptions { rebuild })?;

    match cli.effective_format() {
        OutputFormat::Human => {
            println!("{}", colors::header("Sync"));
            println!();
            print_row("Files checked", report.files_checked);
            print_row("Files updated", report.files_updated);
            print_row("Files unchanged", report.files_skipped);
            print_row("Commands added", report.commands_inserted);
            print_row("Duplicates ignored", report.duplicates_ignored);
            print_row("Outputs attached", report.outputs_attached);
            print_row("Outputs unmatched", report.outputs_unmatched);
            print_row("Lines skipped", report.lines_skipped);

            if !report.errors.is_empty() {
                println!();
                for error in &report.errors {
                    println!("{}", colors::warning(&error.to_string()));
                }
            }
        }
        OutputFormat::Json => {
            let errors: Vec<_> = report
                .errors
                .iter()
                .map(|e| {
                    json!({
                        "path": e.path,
                        "error": e.error.to_string(),
                    })
                })
                .collect();
            let output = json!({
                "files_checked": report.files_checked,
                "files_updated": report.files_updated,
                "files_skipped": report.files_skipped,
                "commands_inserted": report.commands_inserted,
                "duplicates_ignored": report.duplicates_ignored,
                "outputs_attached": report.outputs_attached,
                "outputs_unmatched": report.outputs_unmatched,
                "lines_skipped": report.lines_skipped,
                "errors": errors,
            });
            println!("{}", json::to_string(&output, cli.pretty)?);
        }
    }

    Ok(())
}

/// Run a sync pass over the configured projects directory
///
/// Per-file failures are already logged by the indexer; only a failure to
/// persist the store is returned.
pub fn sync(cli: &Cli, db: &HistoryDb, options: &SyncOptions) -> Result<SyncReport> {
    ran_indexer::sync_with(db, cli.projects_dir.as_deref(), options)
        .context("failed to index transcripts")
}

fn print_row(name: &str, count: usize) {
    println!(
        "  {}: {}",
        colors::label(name),
        colors::value(&colors::format_count(count as i64))
    );
}

//! CLI argument definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Search the shell commands Claude Code has run
#[derive(Parser, Debug)]
#[command(name = "ran")]
#[command(version)]
#[command(about = "Search the shell commands Claude Code has run")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Custom database path
    #[arg(long, global = true, env = "RAN_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Directory containing Claude Code transcripts
    #[arg(long, global = true, env = "RAN_PROJECTS_DIR")]
    pub projects_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Show debug logging
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Explicit format, else human on a terminal and JSON when piped
    pub fn effective_format(&self) -> OutputFormat {
        if let Some(f) = self.format {
            return f;
        }
        if atty::is(atty::Stream::Stdout) {
            OutputFormat::Human
        } else {
            OutputFormat::Json
        }
    }
}

/// Output format for commands
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search command history by substring or regex
    Search {
        /// Pattern to match against the command text
        pattern: String,

        /// Treat the pattern as a regular expression
        #[arg(short, long)]
        regex: bool,

        /// Only commands run in this directory
        #[arg(long)]
        cwd: Option<String>,

        /// Limit results
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Skip indexing new transcript content first
        #[arg(long)]
        no_sync: bool,
    },

    /// List the most recent commands
    List {
        /// Number of commands to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// Skip indexing new transcript content first
        #[arg(long)]
        no_sync: bool,
    },

    /// Index new transcript content
    Sync {
        /// Ignore stored progress and re-read every transcript
        #[arg(long)]
        rebuild: bool,
    },

    /// Show database statistics
    Stats,

    /// Add ran usage notes to ~/.claude/CLAUDE.md
    Onboard {
        /// Replace an existing ran section
        #[arg(long)]
        force: bool,
    },
}

//! Logging initialization
//!
//! Logs go to stderr so stdout stays clean for command output.

use tracing_subscriber::EnvFilter;

/// Filter used when RUST_LOG is not set
pub fn default_directives(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "warn,ran_core=debug,ran_db=debug,ran_indexer=debug,ran_cli=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber; RUST_LOG overrides the flags
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

//! Human-readable output formatting

use super::colors::*;
use ran_core::Command;

const PREVIEW_LEN: usize = 100;

/// Format a stored command as a short block
pub fn format_command(cmd: &Command) -> String {
    let mut header = colored_time(&cmd.format_time());
    if let Some(cwd) = &cmd.cwd {
        header.push_str("  ");
        header.push_str(&colored_cwd(cwd));
    }

    let mut lines = vec![
        header,
        format!("  $ {}", colored_command(&cmd.command, cmd.is_error)),
    ];

    if let Some(description) = &cmd.description {
        lines.push(format!("  {}", label(&format!("# {}", description))));
    }

    if let Some(preview) = cmd.output_preview(PREVIEW_LEN) {
        let marker = if cmd.is_error { "✗" } else { "→" };
        lines.push(format!("  {} {}", marker, label(&preview)));
    }

    lines.join("\n")
}

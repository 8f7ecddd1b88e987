//! Onboard command - teach Claude Code about ran via ~/.claude/CLAUDE.md

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::output::colors;

const MARKER: &str = "<!-- ran:onboard -->";

const RAN_SECTION: &str = "<!-- ran:onboard -->
## ran - Claude Code bash history

Use the `ran` CLI to search commands from previous Claude Code sessions:

- `ran search <pattern>` - Search by substring or regex (`--regex`)
- `ran list` - Show recent commands
- `ran search \"\" --cwd /path` - Filter by directory

Example: \"What docker command did you run?\" → `ran search docker`
";

/// What onboarding did to the target file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardOutcome {
    Created,
    Updated,
    AlreadyPresent,
}

pub fn run(force: bool) -> Result<()> {
    let target = default_target().context("could not determine home directory")?;
    let outcome = onboard(&target, force)?;

    match outcome {
        OnboardOutcome::AlreadyPresent => {
            println!("ran section already exists in {}", target.display());
            println!("Use {} to update it", "--force".cyan());
        }
        OnboardOutcome::Created => {
            println!(
                "{}",
                colors::success(&format!("Created {} with ran section", target.display()))
            );
        }
        OnboardOutcome::Updated => {
            println!(
                "{}",
                colors::success(&format!("Updated {} with ran section", target.display()))
            );
        }
    }

    Ok(())
}

fn default_target() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".claude").join("CLAUDE.md"))
}

/// Add the ran section to `target`, replacing an existing one when `force` is set
pub fn onboard(target: &Path, force: bool) -> Result<OnboardOutcome> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let existing = if target.exists() {
        fs::read_to_string(target)
            .with_context(|| format!("failed to read {}", target.display()))?
    } else {
        String::new()
    };

    if existing.contains(MARKER) && !force {
        return Ok(OnboardOutcome::AlreadyPresent);
    }

    let remaining = remove_section(&existing);
    let content = if remaining.trim().is_empty() {
        RAN_SECTION.to_string()
    } else {
        format!("{}\n\n{}", remaining.trim_end(), RAN_SECTION)
    };

    fs::write(target, content).with_context(|| format!("failed to write {}", target.display()))?;

    Ok(if existing.is_empty() {
        OnboardOutcome::Created
    } else {
        OnboardOutcome::Updated
    })
}

/// Remove a previously written ran section, up to the next `## ` heading
fn remove_section(content: &str) -> String {
    let Some(start) = content.find(MARKER) else {
        return content.to_string();
    };

    // The section's own heading follows the marker; the next one ends it
    let body_start = start + MARKER.len();
    let body = &content[body_start..];
    let own_heading = if body.starts_with("\n## ") { 1 } else { 0 };
    let end = body[own_heading..]
        .find("\n## ")
        .map(|i| body_start + own_heading + i + 1)
        .unwrap_or(content.len());

    format!("{}{}", &content[..start], &content[end..])
}

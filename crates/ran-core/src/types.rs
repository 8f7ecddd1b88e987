//! Core type definitions for command history data

use serde::{Deserialize, Serialize};

/// A command execution as stored in the history database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Database row ID (insertion order, not meaningful otherwise)
    pub id: i64,
    /// ID of the tool_use block that ran the command
    pub tool_use_id: String,
    /// The command text
    pub command: String,
    /// Description supplied alongside the command
    pub description: Option<String>,
    /// Working directory of the session when the command ran
    pub cwd: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    /// Whether the tool reported a failure
    pub is_error: bool,
    /// ISO timestamp of the transcript line
    pub timestamp: Option<String>,
    pub session_id: Option<String>,
}

impl Command {
    /// Format the timestamp in local time (YYYY-MM-DD HH:MM:SS)
    pub fn format_time(&self) -> String {
        match self.timestamp.as_deref() {
            Some(ts) => format_timestamp(ts),
            None => "unknown".to_string(),
        }
    }

    /// First line of the output (stderr for failures), truncated for list display
    pub fn output_preview(&self, max_len: usize) -> Option<String> {
        let output = if self.is_error {
            self.stderr.as_deref().or(self.stdout.as_deref())
        } else {
            self.stdout.as_deref()
        }?;
        let first = output.lines().find(|l| !l.trim().is_empty())?.trim();
        Some(truncate_str(first, max_len))
    }
}

/// A command extracted from a transcript, not yet stored
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewCommand {
    pub tool_use_id: String,
    pub command: String,
    pub description: Option<String>,
    pub cwd: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub is_error: bool,
    pub timestamp: Option<String>,
    pub session_id: Option<String>,
}

impl NewCommand {
    pub fn new(tool_use_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Whether stdout/stderr are still unknown
    pub fn awaiting_output(&self) -> bool {
        self.stdout.is_none() && self.stderr.is_none()
    }

    /// The tool result carried by this command, if it has one
    pub fn output(&self) -> Option<CommandOutput> {
        if self.awaiting_output() {
            return None;
        }
        Some(CommandOutput {
            tool_use_id: self.tool_use_id.clone(),
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
            is_error: self.is_error,
        })
    }

    /// Copy a tool result onto this command
    pub fn apply_output(&mut self, output: &CommandOutput) {
        self.stdout = output.stdout.clone();
        self.stderr = output.stderr.clone();
        self.is_error = output.is_error;
    }
}

/// Result of a tool invocation, reported on a later transcript line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandOutput {
    pub tool_use_id: String,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub is_error: bool,
}

/// Per-file scan state stored in the `indexed_files` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanState {
    /// Bytes of the file already consumed
    pub last_byte_offset: u64,
    /// File modification time (ms since the Unix epoch) at the last scan
    pub last_modified: i64,
}

/// A row of the `indexed_files` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    pub file_path: String,
    pub state: ScanState,
}

/// Content block types that can appear in transcript messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: serde_json::Value,
        #[serde(default)]
        is_error: Option<bool>,
    },
    #[serde(other)]
    Other,
}

/// Format an ISO timestamp in local time, falling back to the raw string
pub fn format_timestamp(timestamp: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        Err(_) => timestamp.to_string(),
    }
}

pub fn truncate_str(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > max_len {
        let truncated: String = chars[..max_len.saturating_sub(3)].iter().collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

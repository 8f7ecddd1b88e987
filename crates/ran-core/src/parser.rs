//! JSONL parsing for transcript byte ranges
//!
//! Transcript files grow while a session runs, so parsing works on the raw
//! bytes appended since the last scan. Only newline-terminated lines are
//! consumed; a trailing partial line is left for the next pass.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

use crate::types::{CommandOutput, ContentBlock, NewCommand};

/// Tool names whose invocations are shell commands
pub const SHELL_TOOL_NAMES: &[&str] = &["Bash"];

/// Why a transcript line produced no events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    InvalidUtf8,
    InvalidJson(String),
    /// Valid entry, but not a shell command or a tool result
    NotACommand,
    /// Shell tool use without a usable `command` input
    MissingCommand { tool_use_id: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidUtf8 => write!(f, "invalid UTF-8"),
            SkipReason::InvalidJson(e) => write!(f, "invalid JSON: {}", e),
            SkipReason::NotACommand => write!(f, "not a command"),
            SkipReason::MissingCommand { tool_use_id } => {
                write!(f, "tool use {} has no command", tool_use_id)
            }
        }
    }
}

/// Something a transcript line says about a tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEvent {
    /// A shell command was issued
    Invocation(NewCommand),
    /// A tool finished (the tool itself is only known by its id)
    Output(CommandOutput),
}

/// Parse result for a single line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// One or more events; never empty
    Parsed(Vec<ToolEvent>),
    Skipped(SkipReason),
}

/// Parse result for a byte range
#[derive(Debug, Default)]
pub struct ParsedChunk {
    pub outcomes: Vec<LineOutcome>,
    /// Bytes up to and including the last newline
    pub consumed: usize,
}

impl ParsedChunk {
    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, LineOutcome::Skipped(_)))
            .count()
    }

    /// Flatten parsed lines into their events, in file order
    pub fn into_events(self) -> impl Iterator<Item = ToolEvent> {
        self.outcomes.into_iter().flat_map(|outcome| match outcome {
            LineOutcome::Parsed(events) => events,
            LineOutcome::Skipped(_) => Vec::new(),
        })
    }
}

/// Commands ready for insertion plus results whose invocation was not in the batch
#[derive(Debug, Default, PartialEq)]
pub struct CommandBatch {
    pub commands: Vec<NewCommand>,
    pub orphan_outputs: Vec<CommandOutput>,
}

/// Parse every complete line in `bytes`
pub fn parse_chunk(bytes: &[u8]) -> ParsedChunk {
    let mut chunk = ParsedChunk::default();

    while let Some(pos) = bytes[chunk.consumed..].iter().position(|&b| b == b'\n') {
        let mut line = &bytes[chunk.consumed..chunk.consumed + pos];
        chunk.consumed += pos + 1;

        if let [rest @ .., b'\r'] = line {
            line = rest;
        }

        let outcome = match std::str::from_utf8(line) {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                parse_line(text)
            }
            Err(_) => LineOutcome::Skipped(SkipReason::InvalidUtf8),
        };

        if let LineOutcome::Skipped(reason) = &outcome {
            trace!("skipping transcript line: {}", reason);
        }
        chunk.outcomes.push(outcome);
    }

    chunk
}

/// Parse a single JSONL line
pub fn parse_line(raw: &str) -> LineOutcome {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => return LineOutcome::Skipped(SkipReason::InvalidJson(e.to_string())),
    };

    let blocks = match parsed
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_array())
    {
        Some(blocks) => blocks,
        None => return LineOutcome::Skipped(SkipReason::NotACommand),
    };

    let session_id = str_field(&parsed, "sessionId");
    let timestamp = str_field(&parsed, "timestamp");
    let cwd = str_field(&parsed, "cwd");
    let tool_use_result = parsed.get("toolUseResult");

    // toolUseResult describes the line's single tool result; with several
    // results on one line it cannot be attributed
    let result_count = blocks
        .iter()
        .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("tool_result"))
        .count();

    let mut events = Vec::new();
    let mut missing: Option<SkipReason> = None;

    for block in blocks {
        let block = match ContentBlock::deserialize(block) {
            Ok(b) => b,
            Err(e) => {
                trace!("skipping content block: {}", e);
                continue;
            }
        };

        match block {
            ContentBlock::ToolUse { id, name, input } => {
                if !SHELL_TOOL_NAMES.contains(&name.as_str()) {
                    continue;
                }
                let command = input
                    .get("command")
                    .and_then(|v| v.as_str())
                    .filter(|c| !c.trim().is_empty());
                let Some(command) = command else {
                    missing = Some(SkipReason::MissingCommand { tool_use_id: id });
                    continue;
                };
                events.push(ToolEvent::Invocation(NewCommand {
                    tool_use_id: id,
                    command: command.to_string(),
                    description: input
                        .get("description")
                        .and_then(|v| v.as_str())
                        .map(String::from),
                    cwd: cwd.clone(),
                    stdout: None,
                    stderr: None,
                    is_error: false,
                    timestamp: timestamp.clone(),
                    session_id: session_id.clone(),
                }));
            }
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                let is_error = is_error.unwrap_or(false);
                let detail = if result_count == 1 {
                    tool_use_result
                } else {
                    None
                };
                events.push(ToolEvent::Output(extract_output(
                    tool_use_id,
                    &content,
                    detail,
                    is_error,
                )));
            }
            ContentBlock::Text { .. } | ContentBlock::Other => {}
        }
    }

    if events.is_empty() {
        LineOutcome::Skipped(missing.unwrap_or(SkipReason::NotACommand))
    } else {
        LineOutcome::Parsed(events)
    }
}

/// Pair invocations with outputs of the same tool_use_id
pub fn assemble(events: impl IntoIterator<Item = ToolEvent>) -> CommandBatch {
    let mut batch = CommandBatch::default();
    let mut outputs = Vec::new();

    for event in events {
        match event {
            ToolEvent::Invocation(cmd) => batch.commands.push(cmd),
            ToolEvent::Output(out) => outputs.push(out),
        }
    }

    let positions: HashMap<String, usize> = batch
        .commands
        .iter()
        .enumerate()
        .map(|(i, c)| (c.tool_use_id.clone(), i))
        .collect();

    for output in outputs {
        match positions.get(&output.tool_use_id) {
            Some(&i) => {
                let cmd = &mut batch.commands[i];
                if cmd.awaiting_output() {
                    cmd.apply_output(&output);
                }
            }
            None => batch.orphan_outputs.push(output),
        }
    }

    batch
}

/// Build a CommandOutput from a tool_result block and the line's toolUseResult
fn extract_output(
    tool_use_id: String,
    content: &Value,
    detail: Option<&Value>,
    is_error: bool,
) -> CommandOutput {
    let structured = detail
        .and_then(|d| d.as_object())
        .filter(|d| d.contains_key("stdout") || d.contains_key("stderr"));

    let (stdout, stderr) = match structured {
        Some(d) => (
            d.get("stdout").and_then(non_empty_str),
            d.get("stderr").and_then(non_empty_str),
        ),
        None => {
            let text = content_text(content);
            if is_error {
                (None, text)
            } else {
                (text, None)
            }
        }
    };

    CommandOutput {
        tool_use_id,
        stdout,
        stderr,
        is_error,
    }
}

/// Text of a tool_result `content`: a string or an array of text blocks
fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(s) => Some(s.clone()).filter(|s| !s.is_empty()),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter(|i| i.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|i| i.get("text").and_then(|t| t.as_str()))
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("\n"))
            }
        }
        _ => None,
    }
}

fn non_empty_str(v: &Value) -> Option<String> {
    v.as_str().filter(|s| !s.is_empty()).map(String::from)
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

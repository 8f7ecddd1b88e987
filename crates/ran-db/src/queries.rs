//! Query functions: recency listing and pattern search

use regex::RegexBuilder;
use rusqlite::Row;

use crate::connection::{DbError, HistoryDb};
use ran_core::Command;

/// Number of commands `list` returns when no limit is given
pub const DEFAULT_LIST_LIMIT: usize = 20;

const SELECT_COMMANDS: &str = "SELECT id, tool_use_id, command, description, cwd, stdout, stderr,
        is_error, timestamp, session_id
     FROM commands";

// Newest first; rows without a timestamp sort last, ties by insertion order
const ORDER_BY_RECENCY: &str = " ORDER BY timestamp DESC, id DESC";

/// Options for searching commands
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub pattern: String,
    /// Treat `pattern` as a regular expression instead of a substring
    pub regex: bool,
    /// Only commands run in exactly this directory
    pub cwd: Option<String>,
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    pub fn with_regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }

    pub fn in_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Search matches, possibly truncated to the query limit
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub commands: Vec<Command>,
    /// Number of matches before the limit was applied
    pub total: usize,
}

impl SearchResults {
    pub fn is_truncated(&self) -> bool {
        self.commands.len() < self.total
    }
}

impl HistoryDb {
    /// All commands, newest first
    pub fn query_all(&self) -> Result<Vec<Command>, DbError> {
        let sql = format!("{}{}", SELECT_COMMANDS, ORDER_BY_RECENCY);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_command)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// The `limit` most recent commands
    pub fn query_by_limit(&self, limit: usize) -> Result<Vec<Command>, DbError> {
        let sql = format!("{}{} LIMIT ?1", SELECT_COMMANDS, ORDER_BY_RECENCY);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([limit as i64], row_to_command)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// List the most recent commands
    pub fn list_commands(&self, limit: usize) -> Result<Vec<Command>, DbError> {
        self.query_by_limit(limit)
    }

    /// Search commands by substring or regex, newest first
    ///
    /// Substring matching uses SQLite's `LIKE`, which folds ASCII case only.
    /// An invalid regex fails before any rows are read.
    pub fn search_commands(&self, query: &SearchQuery) -> Result<SearchResults, DbError> {
        let mut sql = String::from(SELECT_COMMANDS);
        sql.push_str(" WHERE 1=1");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        let matcher = if query.regex {
            Some(
                RegexBuilder::new(&query.pattern)
                    .case_insensitive(true)
                    .build()?,
            )
        } else {
            sql.push_str(" AND command LIKE ? ESCAPE '\\'");
            params.push(Box::new(format!("%{}%", escape_like(&query.pattern))));
            None
        };

        if let Some(cwd) = &query.cwd {
            sql.push_str(" AND cwd = ?");
            params.push(Box::new(cwd.clone()));
        }

        sql.push_str(ORDER_BY_RECENCY);

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), row_to_command)?;

        let mut commands = Vec::new();
        for row in rows {
            let cmd = row?;
            if matcher.as_ref().map_or(true, |re| re.is_match(&cmd.command)) {
                commands.push(cmd);
            }
        }

        let total = commands.len();
        if let Some(limit) = query.limit {
            commands.truncate(limit);
        }

        Ok(SearchResults { commands, total })
    }
}

/// Escape `LIKE` wildcards so the pattern matches literally
fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn row_to_command(row: &Row<'_>) -> rusqlite::Result<Command> {
    Ok(Command {
        id: row.get(0)?,
        tool_use_id: row.get(1)?,
        command: row.get(2)?,
        description: row.get(3)?,
        cwd: row.get(4)?,
        stdout: row.get(5)?,
        stderr: row.get(6)?,
        is_error: row.get::<_, Option<i64>>(7)?.unwrap_or(0) != 0,
        timestamp: row.get(8)?,
        session_id: row.get(9)?,
    })
}

//! Write operations: command inserts and per-file scan state

use rusqlite::{params, ErrorCode, OptionalExtension};

use crate::connection::{DbError, HistoryDb};
use ran_core::{CommandOutput, IndexedFile, NewCommand, ScanState};

/// What to do when a command's tool_use_id is already stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnConflict {
    /// Keep the existing row untouched and report no insert
    #[default]
    Ignore,
    /// Fail with [`DbError::DuplicateToolUse`]
    Fail,
}

impl HistoryDb {
    /// Insert a command; returns whether a new row was written
    pub fn insert_command(
        &self,
        cmd: &NewCommand,
        on_conflict: OnConflict,
    ) -> Result<bool, DbError> {
        let sql = match on_conflict {
            OnConflict::Ignore => {
                "INSERT INTO commands
                 (tool_use_id, command, description, cwd, stdout, stderr, is_error, timestamp, session_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(tool_use_id) DO NOTHING"
            }
            OnConflict::Fail => {
                "INSERT INTO commands
                 (tool_use_id, command, description, cwd, stdout, stderr, is_error, timestamp, session_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            }
        };

        let mut stmt = self.conn.prepare_cached(sql)?;
        let result = stmt.execute(params![
            cmd.tool_use_id,
            cmd.command,
            cmd.description,
            cmd.cwd,
            cmd.stdout,
            cmd.stderr,
            cmd.is_error,
            cmd.timestamp,
            cmd.session_id,
        ]);

        match result {
            Ok(changed) => Ok(changed > 0),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if on_conflict == OnConflict::Fail && e.code == ErrorCode::ConstraintViolation =>
            {
                Err(DbError::DuplicateToolUse(cmd.tool_use_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Insert a command unless its tool_use_id is already stored (first write wins)
    pub fn insert_command_ignoring_duplicates(&self, cmd: &NewCommand) -> Result<bool, DbError> {
        self.insert_command(cmd, OnConflict::Ignore)
    }

    /// Fill in the output of a stored command that has none yet
    ///
    /// Returns false when no such row exists or its output is already set.
    pub fn attach_output(&self, output: &CommandOutput) -> Result<bool, DbError> {
        let mut stmt = self.conn.prepare_cached(
            "UPDATE commands SET stdout = ?2, stderr = ?3, is_error = ?4
             WHERE tool_use_id = ?1 AND stdout IS NULL AND stderr IS NULL",
        )?;
        let changed = stmt.execute(params![
            output.tool_use_id,
            output.stdout,
            output.stderr,
            output.is_error,
        ])?;
        Ok(changed > 0)
    }

    /// Insert or replace the scan state of a transcript file
    pub fn upsert_indexed_file(
        &self,
        file_path: &str,
        byte_offset: u64,
        last_modified: i64,
    ) -> Result<(), DbError> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR REPLACE INTO indexed_files (file_path, last_byte_offset, last_modified)
             VALUES (?1, ?2, ?3)",
        )?;
        stmt.execute(params![file_path, byte_offset as i64, last_modified])?;
        Ok(())
    }

    pub fn get_indexed_file(&self, file_path: &str) -> Result<Option<IndexedFile>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT file_path, last_byte_offset, last_modified
                 FROM indexed_files WHERE file_path = ?1",
                [file_path],
                |row| {
                    let offset: i64 = row.get(1)?;
                    Ok(IndexedFile {
                        file_path: row.get(0)?,
                        state: ScanState {
                            last_byte_offset: offset.max(0) as u64,
                            last_modified: row.get(2)?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn count_commands(&self) -> Result<i64, DbError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM commands", [], |row| row.get(0))?)
    }

    pub fn count_indexed_files(&self) -> Result<i64, DbError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM indexed_files", [], |row| row.get(0))?)
    }
}

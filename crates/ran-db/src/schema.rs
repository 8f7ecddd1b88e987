//! Database schema creation

use rusqlite::Connection;

use crate::connection::DbError;

/// Current schema version, stored in `PRAGMA user_version`
pub const SCHEMA_VERSION: i32 = 1;

/// Create tables and indexes if they do not exist yet
pub fn init_schema(conn: &Connection) -> Result<(), DbError> {
    let found: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if found > SCHEMA_VERSION {
        return Err(DbError::VersionMismatch {
            supported: SCHEMA_VERSION,
            found,
        });
    }

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS commands (
            id INTEGER PRIMARY KEY,
            tool_use_id TEXT UNIQUE,
            command TEXT NOT NULL,
            description TEXT,
            cwd TEXT,
            stdout TEXT,
            stderr TEXT,
            is_error INTEGER DEFAULT 0,
            timestamp TEXT,
            session_id TEXT
        )",
    )?;

    // Scan state for delta indexing
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS indexed_files (
            file_path TEXT PRIMARY KEY,
            last_byte_offset INTEGER DEFAULT 0,
            last_modified INTEGER DEFAULT 0
        )",
    )?;

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_commands_command ON commands(command);
         CREATE INDEX IF NOT EXISTS idx_commands_timestamp ON commands(timestamp);",
    )?;

    conn.execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;

    Ok(())
}

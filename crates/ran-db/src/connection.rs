//! Database connection management

use rusqlite::backup::Progress;
use rusqlite::{Connection, DatabaseName};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::schema;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Command with tool_use_id {0} already exists")]
    DuplicateToolUse(String),

    #[error("Database version mismatch: supported up to {supported}, found {found}")]
    VersionMismatch { supported: i32, found: i32 },
}

impl DbError {
    /// Whether the backing storage could not be read or written
    pub fn is_store_io(&self) -> bool {
        matches!(self, DbError::Sqlite(_) | DbError::Io(_))
    }
}

/// Default database path (~/.ran/history.db)
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("~"))
        .join(".ran")
        .join("history.db")
}

/// Where the store is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Never written anywhere; `persist` is a no-op
    InMemory,
    File(PathBuf),
}

/// Handle to the command history store
///
/// All reads and writes go to an in-memory copy; call [`HistoryDb::persist`]
/// to write it back to the store file.
pub struct HistoryDb {
    pub(crate) conn: Connection,
    location: StoreLocation,
}

impl HistoryDb {
    /// Open the store at the default path
    pub fn open_default() -> Result<Self, DbError> {
        Self::open(default_db_path())
    }

    /// Open the store file at `path`; a missing file is an empty store
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        Self::open_location(StoreLocation::File(path.as_ref().to_path_buf()))
    }

    /// Open an empty store that is never persisted
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::open_location(StoreLocation::InMemory)
    }

    /// Open a store at an explicit location
    pub fn open_location(location: StoreLocation) -> Result<Self, DbError> {
        let mut conn = Connection::open_in_memory()?;

        if let StoreLocation::File(path) = &location {
            if path.exists() {
                conn.restore(DatabaseName::Main, path, None::<fn(Progress)>)?;
                debug!("loaded store from {}", path.display());
            } else {
                debug!("no store at {}, starting empty", path.display());
            }
        }

        schema::init_schema(&conn)?;

        Ok(Self { conn, location })
    }

    /// Get the store file path (None for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            StoreLocation::File(path) => Some(path),
            StoreLocation::InMemory => None,
        }
    }

    /// Get the underlying connection (for custom queries)
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Write the in-memory store to its file, creating parent directories
    ///
    /// The data is written to `<path>.tmp` first and renamed over the store,
    /// so readers never observe a half-written file.
    pub fn persist(&self) -> Result<(), DbError> {
        let path = match &self.location {
            StoreLocation::File(path) => path,
            StoreLocation::InMemory => return Ok(()),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = tmp_path(path);
        if tmp.exists() {
            std::fs::remove_file(&tmp)?;
        }
        self.conn.backup(DatabaseName::Main, &tmp, None)?;
        std::fs::rename(&tmp, path)?;

        debug!("persisted store to {}", path.display());
        Ok(())
    }

    /// Execute a closure within a transaction (rolled back on error)
    pub fn transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DbError>,
    {
        let tx = self.conn.unchecked_transaction().map_err(DbError::from)?;
        let result = f(self)?;
        tx.commit().map_err(DbError::from)?;
        Ok(result)
    }

    /// Get store statistics
    pub fn stats(&self) -> Result<Stats, DbError> {
        let db_size_bytes = self
            .path()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(Stats {
            total_commands: self.count_commands()?,
            indexed_files: self.count_indexed_files()?,
            db_path: self.path().map(Path::to_path_buf),
            db_size_bytes,
        })
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Store statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub total_commands: i64,
    pub indexed_files: i64,
    pub db_path: Option<PathBuf>,
    /// Size of the persisted file (0 if never persisted)
    pub db_size_bytes: u64,
}

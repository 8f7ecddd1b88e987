//! ran-db - SQLite store for ran
//!
//! The store is loaded into an in-memory SQLite connection on open and written
//! back to `~/.ran/history.db` only when [`HistoryDb::persist`] is called.
//! Writes (commands, scan state) live in `commands`, reads in `queries`.

pub mod commands;
pub mod connection;
pub mod queries;
pub mod schema;

pub use commands::OnConflict;
pub use connection::*;
pub use queries::*;

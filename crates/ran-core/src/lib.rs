//! ran-core - Core types and transcript parsing for ran
//!
//! This crate holds the command record types shared by the store, the indexer
//! and the CLI, along with the parser that turns raw transcript bytes into
//! those records.

pub mod parser;
pub mod types;

pub use parser::*;
pub use types::*;

//! CLI command implementations

pub mod list;
pub mod onboard;
pub mod search;
pub mod stats;
pub mod sync;

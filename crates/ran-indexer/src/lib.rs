//! ran-indexer - Incremental indexing of Claude Code transcripts
//!
//! A sync pass walks the transcript files, reads only the bytes appended since
//! the previous pass, and stores every shell command found in them. The store
//! is written to disk once at the end of the pass.

pub mod discovery;
pub mod error;
pub mod indexer;
pub mod scan_state;

pub use discovery::{default_projects_dir, find_transcript_files, TranscriptFile};
pub use error::IndexerError;
pub use indexer::{
    index_file, sync, sync_files, sync_with, FileIndexResult, FileScanError, SyncOptions,
    SyncReport,
};
pub use scan_state::{plan_scan, FileScanStateTracker, ScanPlan};

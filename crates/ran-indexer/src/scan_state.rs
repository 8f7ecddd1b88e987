//! Per-file scan state: where to resume reading a transcript

use ran_core::ScanState;
use ran_db::{DbError, HistoryDb};

use crate::discovery::TranscriptFile;

/// What a pass should do with one transcript file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPlan {
    /// Modification time matches the last scan
    Unchanged,
    /// No bytes past the stored offset
    UpToDate,
    /// Read from `from` to the end; `reset` is set when the file shrank below the stored offset
    Read { from: u64, reset: bool },
}

/// Decide where to resume reading a file of `size` bytes modified at `modified`
pub fn plan_scan(stored: Option<ScanState>, size: u64, modified: i64) -> ScanPlan {
    let Some(state) = stored else {
        return if size == 0 {
            ScanPlan::UpToDate
        } else {
            ScanPlan::Read {
                from: 0,
                reset: false,
            }
        };
    };

    // Truncated or replaced: start over, even if the mtime looks familiar
    if size < state.last_byte_offset {
        return ScanPlan::Read {
            from: 0,
            reset: true,
        };
    }

    if state.last_modified == modified {
        return ScanPlan::Unchanged;
    }

    if state.last_byte_offset == size {
        return ScanPlan::UpToDate;
    }

    ScanPlan::Read {
        from: state.last_byte_offset,
        reset: false,
    }
}

/// Reads and records scan state through the store
pub struct FileScanStateTracker<'a> {
    db: &'a HistoryDb,
}

impl<'a> FileScanStateTracker<'a> {
    pub fn new(db: &'a HistoryDb) -> Self {
        Self { db }
    }

    pub fn state(&self, file: &TranscriptFile) -> Result<Option<ScanState>, DbError> {
        Ok(self.db.get_indexed_file(&file.key())?.map(|f| f.state))
    }

    pub fn plan(&self, file: &TranscriptFile) -> Result<ScanPlan, DbError> {
        Ok(plan_scan(self.state(file)?, file.size, file.modified))
    }

    /// Record that `file` has been consumed up to `byte_offset`
    pub fn record(&self, file: &TranscriptFile, byte_offset: u64) -> Result<(), DbError> {
        self.db
            .upsert_indexed_file(&file.key(), byte_offset, file.modified)
    }
}

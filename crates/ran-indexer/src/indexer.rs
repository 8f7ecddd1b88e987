//! Transcript sync pass
//!
//! Each pass reads the unconsumed suffix of every transcript file, stores the
//! shell commands found there and records how far each file was consumed.
//! Per-file failures are collected in the report; only a failure to persist
//! the store fails the pass.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use ran_core::{assemble, parse_chunk};
use ran_db::HistoryDb;

use crate::discovery::{self, TranscriptFile};
use crate::error::IndexerError;
use crate::scan_state::{plan_scan, FileScanStateTracker, ScanPlan};

/// Options for a sync pass
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Ignore stored scan state and re-read every file from the start
    pub rebuild: bool,
}

/// Result of indexing one byte range of a transcript file
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileIndexResult {
    pub commands_inserted: usize,
    pub duplicates_ignored: usize,
    pub outputs_attached: usize,
    /// Tool results with no stored command awaiting them (other tools, or already attached)
    pub outputs_unmatched: usize,
    pub lines_skipped: usize,
    /// Offset recorded for the file after this range
    pub byte_offset: u64,
}

/// A transcript file that could not be indexed during a pass
#[derive(Error, Debug)]
#[error("{}: {error}", path.display())]
pub struct FileScanError {
    pub path: PathBuf,
    pub error: IndexerError,
}

/// Result of a sync pass
#[derive(Debug, Default)]
pub struct SyncReport {
    pub files_checked: usize,
    pub files_skipped: usize,
    pub files_updated: usize,
    pub lines_skipped: usize,
    pub commands_inserted: usize,
    pub duplicates_ignored: usize,
    pub outputs_attached: usize,
    pub outputs_unmatched: usize,
    pub errors: Vec<FileScanError>,
}

impl SyncReport {
    fn add(&mut self, result: &FileIndexResult) {
        self.files_updated += 1;
        self.lines_skipped += result.lines_skipped;
        self.commands_inserted += result.commands_inserted;
        self.duplicates_ignored += result.duplicates_ignored;
        self.outputs_attached += result.outputs_attached;
        self.outputs_unmatched += result.outputs_unmatched;
    }
}

/// Index the bytes `[from, file.size)` of a transcript file
///
/// Commands, attached outputs and the new scan state are written in one
/// transaction. The recorded offset stops at the last complete line.
pub fn index_file(
    db: &HistoryDb,
    file: &TranscriptFile,
    from: u64,
) -> Result<FileIndexResult, IndexerError> {
    let bytes = read_range(&file.path, from, file.size)?;
    let chunk = parse_chunk(&bytes);

    let mut result = FileIndexResult {
        lines_skipped: chunk.skipped_count(),
        byte_offset: from + chunk.consumed as u64,
        ..Default::default()
    };
    let batch = assemble(chunk.into_events());

    db.transaction(|db| -> Result<(), IndexerError> {
        for cmd in &batch.commands {
            if db.insert_command_ignoring_duplicates(cmd)? {
                result.commands_inserted += 1;
                continue;
            }
            result.duplicates_ignored += 1;

            // The stored row may have been written before its result was seen
            if let Some(output) = cmd.output() {
                if db.attach_output(&output)? {
                    result.outputs_attached += 1;
                }
            }
        }

        for output in &batch.orphan_outputs {
            if db.attach_output(output)? {
                result.outputs_attached += 1;
            } else {
                result.outputs_unmatched += 1;
            }
        }

        FileScanStateTracker::new(db).record(file, result.byte_offset)?;
        Ok(())
    })?;

    Ok(result)
}

/// Run a sync pass over the transcripts in `projects_dir` (default ~/.claude/projects)
pub fn sync(db: &HistoryDb, projects_dir: Option<&Path>) -> Result<SyncReport, IndexerError> {
    sync_with(db, projects_dir, &SyncOptions::default())
}

pub fn sync_with(
    db: &HistoryDb,
    projects_dir: Option<&Path>,
    options: &SyncOptions,
) -> Result<SyncReport, IndexerError> {
    let files = discovery::find_transcript_files(projects_dir);
    sync_files(db, &files, options)
}

/// Run a sync pass over an explicit list of transcript files
pub fn sync_files(
    db: &HistoryDb,
    files: &[PathBuf],
    options: &SyncOptions,
) -> Result<SyncReport, IndexerError> {
    let mut report = SyncReport::default();
    let tracker = FileScanStateTracker::new(db);

    for path in files {
        report.files_checked += 1;

        match sync_one(&tracker, db, path, options) {
            Ok(Some(result)) => {
                debug!(
                    "indexed {}: {} new commands, offset {}",
                    path.display(),
                    result.commands_inserted,
                    result.byte_offset
                );
                report.add(&result);
            }
            Ok(None) => report.files_skipped += 1,
            Err(error) => {
                warn!("failed to index {}: {}", path.display(), error);
                report.errors.push(FileScanError {
                    path: path.clone(),
                    error,
                });
            }
        }
    }

    db.persist()?;

    info!(
        files_checked = report.files_checked,
        files_updated = report.files_updated,
        commands_inserted = report.commands_inserted,
        errors = report.errors.len(),
        "sync complete"
    );

    Ok(report)
}

/// Index one file if it has unconsumed bytes; None when it was skipped
fn sync_one(
    tracker: &FileScanStateTracker<'_>,
    db: &HistoryDb,
    path: &Path,
    options: &SyncOptions,
) -> Result<Option<FileIndexResult>, IndexerError> {
    let file = TranscriptFile::stat(path)?;

    let plan = if options.rebuild {
        plan_scan(None, file.size, file.modified)
    } else {
        tracker.plan(&file)?
    };

    match plan {
        ScanPlan::Unchanged | ScanPlan::UpToDate => {
            debug!("skipping {} ({:?})", path.display(), plan);
            Ok(None)
        }
        ScanPlan::Read { from, reset } => {
            if reset {
                debug!("{} shrank below its recorded offset, rescanning", path.display());
            }
            index_file(db, &file, from).map(Some)
        }
    }
}

/// Read bytes `[from, to)`; fewer if the file shrank since it was stat'ed
fn read_range(path: &Path, from: u64, to: u64) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(from))?;

    let mut bytes = Vec::with_capacity(to.saturating_sub(from) as usize);
    file.take(to.saturating_sub(from)).read_to_end(&mut bytes)?;
    Ok(bytes)
}

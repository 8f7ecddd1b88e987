//! File discovery for transcript JSONL files

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::warn;
use walkdir::WalkDir;

/// Default projects directory (~/.claude/projects)
pub fn default_projects_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("~"))
        .join(".claude")
        .join("projects")
}

/// Find all transcript JSONL files (excluding *.hooks.jsonl)
pub fn find_transcript_files(dir: Option<&Path>) -> Vec<PathBuf> {
    let dir = dir.map(PathBuf::from).unwrap_or_else(default_projects_dir);

    if !dir.exists() {
        return Vec::new();
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&dir).follow_links(true) {
        // Unreadable entries are logged and left out of this pass
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable transcript path: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.ends_with(".jsonl") && !name.ends_with(".hooks.jsonl") {
                    files.push(path.to_path_buf());
                }
            }
        }
    }

    files.sort();
    files
}

/// A transcript file with the metadata a scan decision needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFile {
    pub path: PathBuf,
    pub size: u64,
    /// Modification time in milliseconds since the Unix epoch
    pub modified: i64,
}

impl TranscriptFile {
    pub fn stat(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified,
        })
    }

    /// Key used for the `indexed_files` table
    pub fn key(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

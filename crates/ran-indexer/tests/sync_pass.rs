//! End-to-end sync passes over a temporary projects directory

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use ran_db::{HistoryDb, SearchQuery};
use ran_indexer::{sync, sync_with, SyncOptions};

fn tool_use(id: &str, command: &str, cwd: &str, ts: &str) -> String {
    format!(
        r#"{{"type":"assistant","sessionId":"sess-1","cwd":"{cwd}","timestamp":"{ts}","message":{{"role":"assistant","content":[{{"type":"tool_use","id":"{id}","name":"Bash","input":{{"command":"{command}"}}}}]}}}}"#
    ) + "\n"
}

fn tool_result(id: &str, stdout: &str) -> String {
    format!(
        r#"{{"type":"user","sessionId":"sess-1","message":{{"role":"user","content":[{{"type":"tool_result","tool_use_id":"{id}","content":"{stdout}"}}]}},"toolUseResult":{{"stdout":"{stdout}","stderr":""}}}}"#
    ) + "\n"
}

struct Fixture {
    _tmp: tempfile::TempDir,
    projects: PathBuf,
    db_path: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let projects = tmp.path().join("projects");
        fs::create_dir_all(projects.join("-projects-myapp")).unwrap();
        let db_path = tmp.path().join("store").join("history.db");
        Self {
            _tmp: tmp,
            projects,
            db_path,
        }
    }

    fn transcript(&self, name: &str) -> PathBuf {
        self.projects.join("-projects-myapp").join(name)
    }

    fn open(&self) -> HistoryDb {
        HistoryDb::open(&self.db_path).unwrap()
    }

    fn sync(&self, db: &HistoryDb) -> ran_indexer::SyncReport {
        sync(db, Some(&self.projects)).unwrap()
    }
}

fn append(path: &Path, text: &str) {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    f.write_all(text.as_bytes()).unwrap();
}

/// Make the next pass look at the file regardless of mtime resolution
fn forget_mtime(db: &HistoryDb, path: &Path) {
    let key = path.to_string_lossy();
    let state = db.get_indexed_file(&key).unwrap().unwrap().state;
    db.upsert_indexed_file(&key, state.last_byte_offset, 0)
        .unwrap();
}

fn command_names(db: &HistoryDb) -> Vec<String> {
    db.query_all()
        .unwrap()
        .into_iter()
        .map(|c| c.command)
        .collect()
}

#[test]
fn test_unchanged_file_is_idempotent() {
    let fx = Fixture::new();
    let path = fx.transcript("a.jsonl");
    append(
        &path,
        &tool_use("toolu_1", "npm test", "/projects/myapp", "2024-01-01T00:00:00Z"),
    );

    let db = fx.open();
    let first = fx.sync(&db);
    assert_eq!(first.commands_inserted, 1);

    let second = fx.sync(&db);
    assert_eq!(second.commands_inserted, 0);
    assert_eq!(second.files_skipped, 1);

    forget_mtime(&db, &path);
    let third = fx.sync(&db);
    assert_eq!(third.commands_inserted, 0);
    assert_eq!(db.count_commands().unwrap(), 1);
}

#[test]
fn test_appended_lines_are_picked_up() {
    let fx = Fixture::new();
    let path = fx.transcript("a.jsonl");
    append(
        &path,
        &tool_use("toolu_1", "cargo build", "/projects/myapp", "2024-01-01T00:00:00Z"),
    );

    let db = fx.open();
    fx.sync(&db);

    append(
        &path,
        &tool_use("toolu_2", "cargo test", "/projects/myapp", "2024-01-01T00:01:00Z"),
    );
    forget_mtime(&db, &path);

    let report = fx.sync(&db);
    assert_eq!(report.commands_inserted, 1);
    assert_eq!(report.duplicates_ignored, 0);
    assert_eq!(command_names(&db), vec!["cargo test", "cargo build"]);
    assert_eq!(
        db.get_indexed_file(&path.to_string_lossy())
            .unwrap()
            .unwrap()
            .state
            .last_byte_offset,
        fs::metadata(&path).unwrap().len()
    );
}

#[test]
fn test_truncated_file_is_reread() {
    let fx = Fixture::new();
    let path = fx.transcript("a.jsonl");
    append(
        &path,
        &tool_use("toolu_1", "ls", "/projects/myapp", "2024-01-01T00:00:00Z"),
    );
    append(
        &path,
        &tool_use("toolu_2", "pwd", "/projects/myapp", "2024-01-01T00:00:01Z"),
    );

    let db = fx.open();
    fx.sync(&db);

    let replacement = tool_use("toolu_3", "whoami", "/projects/myapp", "2024-01-02T00:00:00Z");
    fs::write(&path, &replacement).unwrap();

    let report = fx.sync(&db);
    assert!(report.errors.is_empty());
    assert_eq!(report.commands_inserted, 1);
    assert_eq!(command_names(&db), vec!["whoami", "pwd", "ls"]);
    assert_eq!(
        db.get_indexed_file(&path.to_string_lossy())
            .unwrap()
            .unwrap()
            .state
            .last_byte_offset,
        replacement.len() as u64
    );
}

#[test]
fn test_partial_line_waits_for_newline() {
    let fx = Fixture::new();
    let path = fx.transcript("a.jsonl");
    let line = tool_use("toolu_1", "make", "/projects/myapp", "2024-01-01T00:00:00Z");
    let (head, tail) = line.split_at(40);
    append(&path, head);

    let db = fx.open();
    let report = fx.sync(&db);
    assert_eq!(report.commands_inserted, 0);
    assert_eq!(
        db.get_indexed_file(&path.to_string_lossy())
            .unwrap()
            .unwrap()
            .state
            .last_byte_offset,
        0
    );

    append(&path, tail);
    forget_mtime(&db, &path);
    let report = fx.sync(&db);
    assert_eq!(report.commands_inserted, 1);
    assert_eq!(command_names(&db), vec!["make"]);
}

#[test]
fn test_result_in_later_pass_is_attached() {
    let fx = Fixture::new();
    let path = fx.transcript("a.jsonl");
    append(
        &path,
        &tool_use("toolu_1", "git status", "/projects/myapp", "2024-01-01T00:00:00Z"),
    );

    let db = fx.open();
    fx.sync(&db);

    append(&path, &tool_result("toolu_1", "nothing to commit"));
    forget_mtime(&db, &path);
    let report = fx.sync(&db);
    assert_eq!(report.outputs_attached, 1);

    let rows = db.query_all().unwrap();
    let cmd = &rows[0];
    assert_eq!(cmd.command, "git status");
    assert_eq!(cmd.stdout.as_deref(), Some("nothing to commit"));
}

#[test]
fn test_result_in_another_file_fills_stored_command() {
    let fx = Fixture::new();
    let first = fx.transcript("a.jsonl");
    let resumed = fx.transcript("b.jsonl");
    let use_line = tool_use("toolu_1", "cargo build", "/projects/myapp", "2024-01-01T00:00:00Z");
    append(&first, &use_line);
    append(&resumed, &use_line);
    append(&resumed, &tool_result("toolu_1", "built"));

    let db = fx.open();
    let report = ran_indexer::sync_files(&db, &[first, resumed], &SyncOptions::default()).unwrap();
    assert_eq!(report.commands_inserted, 1);
    assert_eq!(report.duplicates_ignored, 1);
    assert_eq!(report.outputs_attached, 1);

    let rows = db.query_all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].stdout.as_deref(), Some("built"));
}

#[test]
fn test_rebuild_fills_missing_output_but_keeps_existing() {
    let fx = Fixture::new();
    let path = fx.transcript("a.jsonl");
    append(
        &path,
        &tool_use("toolu_1", "ls", "/projects/myapp", "2024-01-01T00:00:00Z"),
    );
    append(&path, &tool_result("toolu_1", "README.md"));

    let db = fx.open();
    db.insert_command_ignoring_duplicates(&ran_core::NewCommand::new("toolu_1", "ls"))
        .unwrap();
    let report = sync_with(&db, Some(&fx.projects), &SyncOptions { rebuild: true }).unwrap();
    assert_eq!(report.outputs_attached, 1);

    let report = sync_with(&db, Some(&fx.projects), &SyncOptions { rebuild: true }).unwrap();
    assert_eq!(report.duplicates_ignored, 1);
    assert_eq!(report.outputs_attached, 0);
    assert_eq!(
        db.query_all().unwrap()[0].stdout.as_deref(),
        Some("README.md")
    );
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_does_not_stop_the_pass() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    let locked = fx.transcript("a-locked.jsonl");
    let open = fx.transcript("b-open.jsonl");
    append(
        &locked,
        &tool_use("toolu_1", "secret", "/projects/myapp", "2024-01-01T00:00:00Z"),
    );
    append(
        &open,
        &tool_use("toolu_2", "visible", "/projects/myapp", "2024-01-01T00:00:01Z"),
    );
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root can read anything; nothing to test in that case
    if fs::File::open(&locked).is_ok() {
        return;
    }

    let db = fx.open();
    let report = fx.sync(&db);
    assert_eq!(report.files_checked, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, locked);
    assert_eq!(command_names(&db), vec!["visible"]);
    assert!(db
        .get_indexed_file(&locked.to_string_lossy())
        .unwrap()
        .is_none());
}

#[test]
fn test_sync_persists_and_reopens() {
    let fx = Fixture::new();
    append(
        &fx.transcript("a.jsonl"),
        &tool_use("toolu_1", "docker build -t myapp .", "/projects/myapp", "2024-01-01T00:00:00Z"),
    );
    append(
        &fx.transcript("a.jsonl"),
        &tool_use("toolu_2", "docker push myapp", "/projects/other", "2024-01-02T00:00:00Z"),
    );
    fs::write(fx.transcript("a.hooks.jsonl"), "ignored\n").unwrap();

    {
        let db = fx.open();
        fx.sync(&db);
    }
    assert!(fx.db_path.exists());

    let db = fx.open();
    let stats = db.stats().unwrap();
    assert_eq!(stats.total_commands, 2);
    assert_eq!(stats.indexed_files, 1);

    let results = db
        .search_commands(&SearchQuery::new("DOCKER").in_cwd("/projects/myapp"))
        .unwrap();
    assert_eq!(results.total, 1);
    assert_eq!(results.commands[0].command, "docker build -t myapp .");
}

#[test]
fn test_rebuild_keeps_existing_rows() {
    let fx = Fixture::new();
    append(
        &fx.transcript("a.jsonl"),
        &tool_use("toolu_1", "ls", "/projects/myapp", "2024-01-01T00:00:00Z"),
    );

    let db = fx.open();
    fx.sync(&db);
    let report = sync_with(&db, Some(&fx.projects), &SyncOptions { rebuild: true }).unwrap();
    assert_eq!(report.files_updated, 1);
    assert_eq!(report.duplicates_ignored, 1);
    assert_eq!(db.count_commands().unwrap(), 1);
}

#[test]
fn test_missing_projects_dir_is_empty_pass() {
    let fx = Fixture::new();
    let db = fx.open();
    let report = sync(&db, Some(&fx.projects.join("nope"))).unwrap();
    assert_eq!(report.files_checked, 0);
    assert!(report.errors.is_empty());
}

use clap::Parser;
/// Integration tests for tidyup
///
/// These tests drive the library the way the CLI does: open a session over a
/// state file, scan a folder, classify, execute, undo.
///
/// Test categories:
/// 1. Move batches and the history ledger
/// 2. Undo
/// 3. Classifier output handling
/// 4. State file persistence
/// 5. End-to-end CLI runs
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tidyup::cli::{Cli, run_cli_with_input};
use tidyup::{
    AppConfig, Classifier, Confidence, FileRecord, MoveDirective, Session, Suggestion,
    TidyError,
};

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary workspace holding a folder to organize and a state file.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("inbox")).expect("Failed to create inbox");
        TestFixture { temp_dir }
    }

    /// The folder being organized.
    fn inbox(&self) -> PathBuf {
        self.temp_dir.path().join("inbox")
    }

    fn state_path(&self) -> PathBuf {
        self.temp_dir.path().join("state").join("settings.json")
    }

    fn config_path(&self) -> PathBuf {
        let path = self.temp_dir.path().join("config.toml");
        if !path.exists() {
            fs::write(&path, "").expect("Failed to write config");
        }
        path
    }

    fn session(&self) -> Session {
        Session::open(AppConfig::default(), self.state_path()).expect("Failed to open session")
    }

    fn create_file(&self, name: &str, content: &[u8]) {
        let mut file = File::create(self.inbox().join(name)).expect("Failed to create file");
        file.write_all(content).expect("Failed to write file content");
    }

    fn create_text_file(&self, name: &str, content: &str) {
        self.create_file(name, content.as_bytes());
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.inbox().join(rel_path)).expect("Failed to read file")
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.inbox().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.inbox().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    fn directive(&self, name: &str, folder: &str) -> MoveDirective {
        MoveDirective {
            name: name.to_string(),
            folder: folder.to_string(),
            source: self.inbox().join(name),
        }
    }

    fn run(&self, args: &[&str], input: &str) -> tidyup::Result<()> {
        let config = self.config_path();
        let state = self.state_path();
        let mut argv = vec![
            "tidyup",
            "--config",
            config.to_str().unwrap(),
            "--state",
            state.to_str().unwrap(),
        ];
        argv.extend_from_slice(args);
        run_cli_with_input(Cli::parse_from(argv), &mut Cursor::new(input.to_string()))
    }
}

/// A classifier that answers from a fixed table.
struct ScriptedClassifier {
    replies: Vec<Suggestion>,
}

impl ScriptedClassifier {
    fn new(replies: &[(&str, &str)]) -> Self {
        Self {
            replies: replies
                .iter()
                .map(|(name, folder)| Suggestion {
                    name: name.to_string(),
                    folder: folder.to_string(),
                    confidence: Confidence::High,
                    reason: "scripted".to_string(),
                })
                .collect(),
        }
    }
}

impl Classifier for ScriptedClassifier {
    fn classify(&self, _files: &[FileRecord]) -> tidyup::Result<Vec<Suggestion>> {
        Ok(self.replies.clone())
    }
}

struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn classify(&self, _files: &[FileRecord]) -> tidyup::Result<Vec<Suggestion>> {
        Err(TidyError::Classifier("service unavailable".to_string()))
    }
}

const PNG_HEADER: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
    0x77, 0x53, 0xDE,
];

const ZIP_HEADER: &[u8] = &[0x50, 0x4B, 0x03, 0x04, 0x14, 0x00, 0x00, 0x00];

// ============================================================================
// Test Suite 1: Move batches
// ============================================================================

#[test]
fn test_move_then_undo_round_trip() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "alpha");
    let mut session = fixture.session();
    let before = session.history_count();

    let results = session
        .execute_moves(&[fixture.directive("a.txt", "Docs")], &fixture.inbox())
        .unwrap();

    assert!(results[0].success);
    fixture.assert_file_exists("Docs/a.txt");
    fixture.assert_file_not_exists("a.txt");
    assert_eq!(session.history_count(), before + 1);

    let report = session.undo_last();
    assert!(report.success);
    assert_eq!(report.count, 1);
    fixture.assert_file_exists("a.txt");
    fixture.assert_file_not_exists("Docs/a.txt");
    assert_eq!(fixture.read("a.txt"), "alpha");
    assert_eq!(session.history_count(), before);
}

#[test]
fn test_results_match_directives_in_order() {
    let fixture = TestFixture::new();
    fixture.create_text_file("one.txt", "1");
    fixture.create_text_file("three.txt", "3");
    let mut session = fixture.session();

    let directives = vec![
        fixture.directive("one.txt", "Docs"),
        fixture.directive("two.txt", "Docs"),
        fixture.directive("three.txt", "../escape"),
    ];
    let results = session.execute_moves(&directives, &fixture.inbox()).unwrap();

    let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["one.txt", "two.txt", "three.txt"]);
    let success: Vec<_> = results.iter().map(|r| r.success).collect();
    assert_eq!(success, vec![true, false, false]);
    fixture.assert_file_exists("three.txt");
}

#[test]
fn test_same_destination_twice_second_collides() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "first");
    let mut session = fixture.session();

    let directive = fixture.directive("a.txt", "Docs");
    let results = session
        .execute_moves(&[directive.clone(), directive], &fixture.inbox())
        .unwrap();

    assert!(results[0].success);
    assert!(!results[1].success);
    assert_eq!(
        results[1].error.as_deref(),
        Some("File already exists at destination")
    );
    assert_eq!(fixture.read("Docs/a.txt"), "first");
    assert_eq!(session.history()[0].moves.len(), 1);
}

#[test]
fn test_all_failed_batch_adds_no_history() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "new");
    fs::create_dir(fixture.inbox().join("Docs")).unwrap();
    fs::write(fixture.inbox().join("Docs").join("a.txt"), "old").unwrap();
    let mut session = fixture.session();

    let results = session
        .execute_moves(&[fixture.directive("a.txt", "Docs")], &fixture.inbox())
        .unwrap();

    assert!(!results[0].success);
    assert_eq!(session.history_count(), 0);
    assert_eq!(fixture.read("a.txt"), "new");
    assert!(!fixture.state_path().exists(), "Nothing should be persisted");
}

// ============================================================================
// Test Suite 2: Undo
// ============================================================================

#[test]
fn test_undo_on_empty_ledger_reports_nothing_to_undo() {
    let fixture = TestFixture::new();
    let mut session = fixture.session();

    let report = session.undo_last();
    assert!(!report.success);
    assert_eq!(report.error.as_deref(), Some("Nothing to undo"));
    assert_eq!(session.history_count(), 0);
}

#[test]
fn test_undo_only_reverts_most_recent_batch() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");
    fixture.create_text_file("b.txt", "b");
    let mut session = fixture.session();

    session
        .execute_moves(&[fixture.directive("a.txt", "First")], &fixture.inbox())
        .unwrap();
    session
        .execute_moves(&[fixture.directive("b.txt", "Second")], &fixture.inbox())
        .unwrap();

    session.undo_last();
    fixture.assert_file_exists("b.txt");
    fixture.assert_file_exists("First/a.txt");
    assert_eq!(session.history_count(), 1);

    session.undo_last();
    fixture.assert_file_exists("a.txt");
    assert_eq!(session.history_count(), 0);
}

#[test]
fn test_undo_survives_restart() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");

    {
        let mut session = fixture.session();
        session
            .execute_moves(&[fixture.directive("a.txt", "Docs")], &fixture.inbox())
            .unwrap();
    }

    let mut session = fixture.session();
    assert_eq!(session.history_count(), 1);
    let report = session.undo_last();
    assert_eq!(report.count, 1);
    fixture.assert_file_exists("a.txt");

    let reopened = fixture.session();
    assert_eq!(reopened.history_count(), 0);
}

#[test]
fn test_undo_with_externally_moved_file() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");
    fixture.create_text_file("b.txt", "b");
    let mut session = fixture.session();

    session
        .execute_moves(
            &[fixture.directive("a.txt", "Docs"), fixture.directive("b.txt", "Docs")],
            &fixture.inbox(),
        )
        .unwrap();
    fs::rename(
        fixture.inbox().join("Docs").join("a.txt"),
        fixture.inbox().join("elsewhere.txt"),
    )
    .unwrap();

    let report = session.undo_last();
    assert!(report.success);
    assert_eq!(report.count, 1);
    assert_eq!(report.results[0].name, "b.txt");
    assert!(report.results[0].success);
    assert_eq!(report.results[1].error.as_deref(), Some("File not found"));
    assert_eq!(session.history_count(), 0);
}

// ============================================================================
// Test Suite 3: Classifier output handling
// ============================================================================

#[test]
fn test_hallucinated_names_are_excluded() {
    let fixture = TestFixture::new();
    fixture.create_text_file("real.txt", "x");
    let mut session = fixture.session();

    let files = session.scan_folder(&fixture.inbox()).unwrap();
    let classifier = ScriptedClassifier::new(&[("real.txt", "Docs"), ("imaginary.txt", "Docs")]);
    let suggestions = session.analyze_files(&classifier, &files).unwrap();
    let directives = session.plan_moves(&files, &suggestions);

    assert_eq!(directives.len(), 1);
    assert_eq!(directives[0].name, "real.txt");

    let results = session.execute_moves(&directives, &fixture.inbox()).unwrap();
    assert_eq!(results.len(), 1);
    fixture.assert_file_exists("Docs/real.txt");
}

#[test]
fn test_classifier_failure_moves_nothing() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "x");
    let session = fixture.session();

    let files = session.scan_folder(&fixture.inbox()).unwrap();
    let result = session.analyze_files(&FailingClassifier, &files);

    assert!(matches!(result, Err(TidyError::Classifier(_))));
    fixture.assert_file_exists("a.txt");
    assert_eq!(session.history_count(), 0);
}

#[test]
fn test_offline_classifier_end_to_end() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.png", PNG_HEADER);
    fixture.create_file("bundle.zip", ZIP_HEADER);
    fixture.create_text_file("notes.txt", "hello");
    let mut session = fixture.session();

    let files = session.scan_folder(&fixture.inbox()).unwrap();
    let classifier = session.offline_classifier();
    let suggestions = session.analyze_files(&classifier, &files).unwrap();
    let directives = session.plan_moves(&files, &suggestions);
    let results = session.execute_moves(&directives, &fixture.inbox()).unwrap();

    assert!(results.iter().all(|r| r.success));
    fixture.assert_file_exists("Images/photo.png");
    fixture.assert_file_exists("Archives/bundle.zip");
    fixture.assert_file_exists("Documents/notes.txt");
}

// ============================================================================
// Test Suite 4: State file
// ============================================================================

#[test]
fn test_state_file_keeps_unknown_fields_and_key() {
    let fixture = TestFixture::new();
    fs::create_dir_all(fixture.state_path().parent().unwrap()).unwrap();
    fs::write(
        fixture.state_path(),
        r#"{"apiKey": "sk-existing", "windowBounds": {"width": 800}}"#,
    )
    .unwrap();
    fixture.create_text_file("a.txt", "a");

    let mut session = fixture.session();
    session
        .execute_moves(&[fixture.directive("a.txt", "Docs")], &fixture.inbox())
        .unwrap();
    session.undo_last();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(fixture.state_path()).unwrap()).unwrap();
    assert_eq!(raw["apiKey"], "sk-existing");
    assert_eq!(raw["windowBounds"]["width"], 800);
    assert_eq!(raw["history"].as_array().map(Vec::len), Some(0));
}

#[test]
fn test_history_is_written_in_readable_layout() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");
    let mut session = fixture.session();
    session
        .execute_moves(&[fixture.directive("a.txt", "Docs")], &fixture.inbox())
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(fixture.state_path()).unwrap()).unwrap();
    let entry = &raw["history"][0];
    assert!(entry["timestamp"].is_string());
    assert_eq!(
        Path::new(entry["baseFolder"].as_str().unwrap()),
        fixture.inbox()
    );
    assert_eq!(entry["moves"][0]["name"], "a.txt");
    assert_eq!(
        Path::new(entry["moves"][0]["to"].as_str().unwrap()),
        fixture.inbox().join("Docs").join("a.txt")
    );
}

// ============================================================================
// Test Suite 5: CLI
// ============================================================================

#[test]
fn test_cli_offline_organize_and_undo() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.png", PNG_HEADER);
    fixture.create_text_file(".hidden", "secret");
    let inbox = fixture.inbox();

    fixture
        .run(&["organize", inbox.to_str().unwrap(), "--offline", "--yes"], "")
        .unwrap();
    fixture.assert_file_exists("Images/photo.png");
    fixture.assert_file_exists(".hidden");
    assert_eq!(fixture.session().history_count(), 1);

    fixture.run(&["undo"], "").unwrap();
    fixture.assert_file_exists("photo.png");
    assert_eq!(fixture.session().history_count(), 0);
}

#[test]
fn test_cli_declined_confirmation_moves_nothing() {
    let fixture = TestFixture::new();
    fixture.create_text_file("notes.txt", "x");
    let inbox = fixture.inbox();

    fixture
        .run(&["organize", inbox.to_str().unwrap(), "--offline"], "n\n")
        .unwrap();
    fixture.assert_file_exists("notes.txt");
    assert_eq!(fixture.session().history_count(), 0);
}

#[test]
fn test_cli_dry_run_and_skip() {
    let fixture = TestFixture::new();
    fixture.create_text_file("keep.txt", "x");
    fixture.create_text_file("move.txt", "y");
    let inbox = fixture.inbox();

    fixture
        .run(&["organize", inbox.to_str().unwrap(), "--offline", "--dry-run"], "")
        .unwrap();
    fixture.assert_file_exists("keep.txt");
    fixture.assert_file_exists("move.txt");

    fixture
        .run(
            &["organize", inbox.to_str().unwrap(), "--offline", "--yes", "--skip", "keep.txt"],
            "",
        )
        .unwrap();
    fixture.assert_file_exists("keep.txt");
    fixture.assert_file_exists("Documents/move.txt");
}

#[test]
fn test_cli_empty_folder_is_an_error() {
    let fixture = TestFixture::new();
    let inbox = fixture.inbox();

    let result = fixture.run(&["organize", inbox.to_str().unwrap(), "--offline", "--yes"], "");
    assert!(matches!(result, Err(TidyError::NoFilesFound(_))));
}

#[test]
fn test_cli_missing_folder_is_an_error() {
    let fixture = TestFixture::new();
    let missing = fixture.inbox().join("nope");

    let result = fixture.run(&["scan", missing.to_str().unwrap()], "");
    assert!(matches!(result, Err(TidyError::InvalidBasePath { .. })));
}

#[test]
fn test_cli_set_key_then_history() {
    let fixture = TestFixture::new();

    assert!(matches!(
        fixture.run(&["set-key", "bogus"], ""),
        Err(TidyError::InvalidApiKey)
    ));
    fixture.run(&["set-key", "sk-123"], "").unwrap();
    assert_eq!(
        fixture.session().api_key().unwrap().as_deref(),
        Some("sk-123")
    );

    fixture.run(&["history"], "").unwrap();
    fixture.run(&["undo", "--dry-run"], "").unwrap();
}

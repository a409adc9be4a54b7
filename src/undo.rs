/// Undo of the most recent move batch.
///
/// The batch is taken off the ledger before any file is touched and its moves
/// are reversed last-first. Files that are gone from where the batch put them
/// are reported and forgotten. Files that could not be restored for any other
/// reason (the original location is taken, a rename failed) are put back on
/// the ledger as a smaller entry, so the next undo retries just those.
use crate::history::{HistoryEntry, HistoryLedger, MoveRecord};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

pub const NOTHING_TO_UNDO: &str = "Nothing to undo";
pub const FILE_NOT_FOUND: &str = "File not found";
pub const ORIGINAL_OCCUPIED: &str = "Original location is occupied";

/// Outcome for one file of the undone batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRestore {
    pub name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of [`undo_last`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndoReport {
    /// False only when there was nothing to undo.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub results: Vec<FileRestore>,
    /// Number of files actually restored.
    pub count: usize,
    /// Number of moves kept on the ledger for a later retry.
    pub retained: usize,
}

impl UndoReport {
    fn nothing_to_undo() -> Self {
        Self {
            success: false,
            error: Some(NOTHING_TO_UNDO.to_string()),
            results: Vec::new(),
            count: 0,
            retained: 0,
        }
    }

    pub fn is_complete_success(&self) -> bool {
        self.success && self.results.iter().all(|r| r.success)
    }
}

enum RestoreError {
    /// The file can never be restored from this record.
    Lost(String),
    /// Worth trying again later.
    Retryable(String),
}

fn restore_file(record: &MoveRecord) -> Result<(), RestoreError> {
    if !record.to.exists() {
        return Err(RestoreError::Lost(FILE_NOT_FOUND.to_string()));
    }

    if record.from.exists() {
        return Err(RestoreError::Retryable(ORIGINAL_OCCUPIED.to_string()));
    }

    if let Some(parent) = record.from.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            RestoreError::Retryable(format!(
                "Could not recreate {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    fs::rename(&record.to, &record.from).map_err(|e| RestoreError::Retryable(e.to_string()))
}

/// Undoes the most recent batch on `ledger` and persists the ledger.
///
/// An empty ledger is not an error: the report says "Nothing to undo" and
/// nothing changes.
pub fn undo_last(ledger: &mut HistoryLedger) -> UndoReport {
    let Some(entry) = ledger.pop() else {
        return UndoReport::nothing_to_undo();
    };

    log::info!(
        "undoing {} moves from {} in {}",
        entry.moves.len(),
        entry.timestamp,
        entry.base_folder.display()
    );

    let mut results = Vec::with_capacity(entry.moves.len());
    let mut retry: Vec<MoveRecord> = Vec::new();

    for record in entry.moves.iter().rev() {
        let outcome = restore_file(record);
        let error = match outcome {
            Ok(()) => {
                log::debug!(
                    "restored {} -> {}",
                    record.to.display(),
                    record.from.display()
                );
                None
            }
            Err(RestoreError::Lost(reason)) => {
                log::warn!("cannot restore {}: {}", record.name, reason);
                Some(reason)
            }
            Err(RestoreError::Retryable(reason)) => {
                log::warn!("restore of {} failed, keeping it: {}", record.name, reason);
                retry.push(record.clone());
                Some(reason)
            }
        };

        results.push(FileRestore {
            name: record.name.clone(),
            success: error.is_none(),
            error,
        });
    }

    let retained = retry.len();
    if !retry.is_empty() {
        // `retry` is in reverse execution order; entries store execution order.
        retry.reverse();
        ledger.push_unsaved(HistoryEntry {
            moves: retry,
            ..entry
        });
    }

    if let Err(e) = ledger.persist() {
        log::error!("undo finished but the history could not be saved: {e}");
    }

    let count = results.iter().filter(|r| r.success).count();
    UndoReport {
        success: true,
        error: None,
        results,
        count,
        retained,
    }
}

/// Restore target of every move in the most recent batch, without moving
/// anything.
pub fn preview_last(ledger: &HistoryLedger) -> Vec<(String, PathBuf)> {
    ledger
        .entries()
        .last()
        .map(|entry| {
            entry
                .moves
                .iter()
                .rev()
                .map(|m| (m.name.clone(), m.from.clone()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_organizer::{MoveDirective, execute_moves};
    use crate::settings::SettingsStore;
    use std::path::Path;
    use tempfile::TempDir;

    fn directive(base: &Path, name: &str, folder: &str) -> MoveDirective {
        MoveDirective {
            name: name.to_string(),
            folder: folder.to_string(),
            source: base.join(name),
        }
    }

    #[test]
    fn test_undo_empty_ledger() {
        let mut ledger = HistoryLedger::in_memory();
        let report = undo_last(&mut ledger);
        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some(NOTHING_TO_UNDO));
        assert_eq!(report.count, 0);
    }

    #[test]
    fn test_undo_restores_in_reverse_order() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        fs::write(base.join("a.txt"), "a").unwrap();
        fs::write(base.join("b.txt"), "b").unwrap();

        let mut ledger = HistoryLedger::in_memory();
        execute_moves(
            &mut ledger,
            &[directive(base, "a.txt", "Docs"), directive(base, "b.txt", "Docs")],
            base,
        )
        .unwrap();

        let report = undo_last(&mut ledger);
        let names: Vec<_> = report.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b.txt", "a.txt"]);
        assert_eq!(report.count, 2);
        assert!(report.is_complete_success());
        assert!(base.join("a.txt").is_file());
        assert!(base.join("b.txt").is_file());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_missing_file_is_dropped() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        fs::write(base.join("a.txt"), "a").unwrap();

        let mut ledger = HistoryLedger::in_memory();
        execute_moves(&mut ledger, &[directive(base, "a.txt", "Docs")], base).unwrap();
        fs::remove_file(base.join("Docs").join("a.txt")).unwrap();

        let report = undo_last(&mut ledger);
        assert!(report.success);
        assert_eq!(report.count, 0);
        assert_eq!(report.results[0].error.as_deref(), Some(FILE_NOT_FOUND));
        assert_eq!(report.retained, 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_occupied_original_is_kept_for_retry() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        fs::write(base.join("a.txt"), "moved").unwrap();
        fs::write(base.join("b.txt"), "b").unwrap();

        let mut ledger = HistoryLedger::in_memory();
        execute_moves(
            &mut ledger,
            &[directive(base, "a.txt", "Docs"), directive(base, "b.txt", "Docs")],
            base,
        )
        .unwrap();
        fs::write(base.join("a.txt"), "newcomer").unwrap();

        let report = undo_last(&mut ledger);
        assert_eq!(report.count, 1);
        assert_eq!(report.retained, 1);
        assert_eq!(fs::read_to_string(base.join("a.txt")).unwrap(), "newcomer");
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.entries()[0].moves[0].name, "a.txt");

        fs::remove_file(base.join("a.txt")).unwrap();
        let retry = undo_last(&mut ledger);
        assert!(retry.is_complete_success());
        assert_eq!(fs::read_to_string(base.join("a.txt")).unwrap(), "moved");
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_kept_moves_are_saved_to_the_state_file() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("inbox");
        fs::create_dir(&base).unwrap();
        fs::write(base.join("a.txt"), "moved").unwrap();
        fs::write(base.join("b.txt"), "b").unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        let mut ledger = HistoryLedger::open(store.clone()).unwrap();
        execute_moves(
            &mut ledger,
            &[directive(&base, "a.txt", "Docs"), directive(&base, "b.txt", "Docs")],
            &base,
        )
        .unwrap();
        fs::write(base.join("a.txt"), "newcomer").unwrap();

        let report = undo_last(&mut ledger);
        assert_eq!(report.retained, 1);

        let reopened = HistoryLedger::open(store).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.entries()[0].moves.len(), 1);
        assert_eq!(reopened.entries()[0].moves[0].name, "a.txt");
        assert_eq!(reopened.entries()[0].moves[0].from, base.join("a.txt"));
    }

    #[test]
    fn test_preview_lists_restore_targets() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        fs::write(base.join("a.txt"), "a").unwrap();

        let mut ledger = HistoryLedger::in_memory();
        assert!(preview_last(&ledger).is_empty());

        execute_moves(&mut ledger, &[directive(base, "a.txt", "Docs")], base).unwrap();
        assert_eq!(
            preview_last(&ledger),
            vec![("a.txt".to_string(), base.join("a.txt"))]
        );
    }
}

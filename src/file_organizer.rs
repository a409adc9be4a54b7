/// Move planning and execution.
///
/// Classifier suggestions become [`MoveDirective`]s only when they name a file
/// that was actually scanned. Executing a batch moves each file independently:
/// one failure never stops the others, and every directive yields exactly one
/// [`MoveResult`] in input order. The successful moves of a batch become one
/// history entry.
use crate::classifier::Suggestion;
use crate::error::{Result, TidyError};
use crate::history::{HistoryEntry, HistoryLedger, MoveRecord};
use crate::scanner::FileRecord;
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const DESTINATION_EXISTS: &str = "File already exists at destination";
pub const DESTINATION_ESCAPES_BASE: &str = "Destination escapes base folder";

/// An accepted suggestion, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveDirective {
    pub name: String,
    /// Relative to the base folder.
    pub folder: String,
    pub source: PathBuf,
}

/// Outcome of one directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveResult {
    pub name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MoveResult {
    fn moved(name: &str, new_path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            new_path: Some(new_path),
            error: None,
        }
    }

    fn failed(name: &str, error: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            new_path: None,
            error: Some(error.into()),
        }
    }
}

/// Joins suggestions with the scanned records they name.
///
/// Suggestions for files that were never scanned are dropped, as are repeat
/// suggestions for a file already planned.
pub fn plan_moves(records: &[FileRecord], suggestions: &[Suggestion]) -> Vec<MoveDirective> {
    let mut planned = HashSet::new();
    let mut directives = Vec::new();

    for suggestion in suggestions {
        let Some(record) = records.iter().find(|r| r.name == suggestion.name) else {
            log::warn!(
                "classifier suggested a file that was not scanned: {}",
                suggestion.name
            );
            continue;
        };

        if !planned.insert(record.name.as_str()) {
            log::warn!("ignoring repeated suggestion for {}", record.name);
            continue;
        }

        directives.push(MoveDirective {
            name: record.name.clone(),
            folder: suggestion.folder.clone(),
            source: record.path.clone(),
        });
    }

    directives
}

/// Whether `folder` stays inside the base folder once joined to it.
fn is_contained(folder: &Path) -> bool {
    folder
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Moves one file. `Err` carries the message for the failed [`MoveResult`].
fn move_one(directive: &MoveDirective, base: &Path) -> std::result::Result<PathBuf, String> {
    let folder = Path::new(&directive.folder);
    if !is_contained(folder) {
        return Err(DESTINATION_ESCAPES_BASE.to_string());
    }

    // `name` is lossy for non-UTF-8 names; the source path keeps the real one.
    let file_name = directive
        .source
        .file_name()
        .unwrap_or_else(|| OsStr::new(&directive.name));
    let destination_dir = base.join(folder);
    let destination = destination_dir.join(file_name);

    fs::create_dir_all(&destination_dir).map_err(|e| {
        format!(
            "Failed to create directory {}: {}",
            destination_dir.display(),
            e
        )
    })?;

    if destination.exists() {
        return Err(DESTINATION_EXISTS.to_string());
    }

    fs::rename(&directive.source, &destination).map_err(|e| e.to_string())?;
    Ok(destination)
}

/// Executes a batch and records it in `ledger`.
///
/// See [`execute_moves_with_progress`].
pub fn execute_moves(
    ledger: &mut HistoryLedger,
    directives: &[MoveDirective],
    base: &Path,
) -> Result<Vec<MoveResult>> {
    execute_moves_with_progress(ledger, directives, base, |_| {})
}

/// Executes a batch, calling `on_result` after each directive.
///
/// The destination of each directive is `base/folder/name`. Missing folders
/// are created; an existing destination is never overwritten. Successful moves
/// are appended to `ledger` as one entry and persisted. A failure to persist
/// is logged and does not hide the results, since the files have already
/// moved.
///
/// # Errors
///
/// `InvalidBasePath` when `base` does not exist; nothing is moved.
pub fn execute_moves_with_progress(
    ledger: &mut HistoryLedger,
    directives: &[MoveDirective],
    base: &Path,
    mut on_result: impl FnMut(&MoveResult),
) -> Result<Vec<MoveResult>> {
    if !base.is_dir() {
        return Err(TidyError::InvalidBasePath {
            path: base.to_path_buf(),
            reason: "not an existing directory".to_string(),
        });
    }

    let mut entry = HistoryEntry::new(base.to_path_buf());
    let mut results = Vec::with_capacity(directives.len());

    for directive in directives {
        let result = match move_one(directive, base) {
            Ok(destination) => {
                log::debug!(
                    "moved {} -> {}",
                    directive.source.display(),
                    destination.display()
                );
                entry.record(MoveRecord {
                    name: directive.name.clone(),
                    from: directive.source.clone(),
                    to: destination.clone(),
                });
                MoveResult::moved(&directive.name, destination)
            }
            Err(reason) => {
                log::warn!("could not move {}: {}", directive.name, reason);
                MoveResult::failed(&directive.name, reason)
            }
        };
        on_result(&result);
        results.push(result);
    }

    let moved = entry.moves.len();
    log::info!(
        "moved {} of {} files in {}",
        moved,
        directives.len(),
        base.display()
    );

    if let Err(e) = ledger.append(entry) {
        log::error!("batch of {moved} moves is not saved to disk: {e}");
    }

    Ok(results)
}

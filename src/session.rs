//! The operations a front end drives, over one owned ledger.
//!
//! A [`Session`] is opened once per process: it loads the configuration's
//! scan filter and the history from the state file, and every operation that
//! changes the history writes it back before returning.

use crate::classifier::{Classifier, Suggestion};
use crate::config::{AppConfig, ScanFilter};
use crate::error::{Result, TidyError};
use crate::file_category::HeuristicClassifier;
use crate::file_organizer::{self, MoveDirective, MoveResult};
use crate::history::{HistoryEntry, HistoryLedger};
use crate::openai::OpenAiClassifier;
use crate::scanner::{self, FileRecord};
use crate::settings::SettingsStore;
use crate::undo::{self, UndoReport};
use std::path::{Path, PathBuf};

/// Environment variable consulted when the state file holds no key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub struct Session {
    config: AppConfig,
    filter: ScanFilter,
    store: SettingsStore,
    ledger: HistoryLedger,
}

impl Session {
    /// Opens a session whose state lives at `state_path`.
    pub fn open(config: AppConfig, state_path: impl Into<PathBuf>) -> Result<Self> {
        let filter = config.scan.compile()?;
        let store = SettingsStore::new(state_path);
        let ledger = HistoryLedger::open(store.clone())?;
        Ok(Self {
            config,
            filter,
            store,
            ledger,
        })
    }

    pub fn state_path(&self) -> &Path {
        self.store.path()
    }

    pub fn select_folder(&self, path: &Path) -> Option<PathBuf> {
        scanner::select_folder(path)
    }

    /// Scans `folder`; an empty result is reported as `NoFilesFound`.
    pub fn scan_folder(&self, folder: &Path) -> Result<Vec<FileRecord>> {
        let files = scanner::scan_folder(folder, &self.filter)?;
        if files.is_empty() {
            return Err(TidyError::NoFilesFound(folder.to_path_buf()));
        }
        Ok(files)
    }

    /// The stored API key, or the environment fallback.
    pub fn api_key(&self) -> Result<Option<String>> {
        let stored = self.store.load()?.api_key;
        Ok(pick_api_key(stored, || std::env::var(API_KEY_ENV).ok()))
    }

    /// Validates and persists an API key.
    pub fn save_api_key(&self, api_key: &str) -> Result<()> {
        let api_key = api_key.trim();
        if !api_key.starts_with("sk-") {
            return Err(TidyError::InvalidApiKey);
        }
        self.store.save_api_key(api_key)
    }

    /// The remote classifier. Fails fast without a key.
    pub fn remote_classifier(&self) -> Result<OpenAiClassifier> {
        let api_key = self.api_key()?.ok_or(TidyError::MissingApiKey)?;
        OpenAiClassifier::new(api_key, self.config.classifier.clone())
    }

    pub fn offline_classifier(&self) -> HeuristicClassifier {
        HeuristicClassifier::new()
    }

    pub fn analyze_files(
        &self,
        classifier: &dyn Classifier,
        files: &[FileRecord],
    ) -> Result<Vec<Suggestion>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        let suggestions = classifier.classify(files)?;
        log::info!(
            "classifier returned {} suggestions for {} files",
            suggestions.len(),
            files.len()
        );
        Ok(suggestions)
    }

    pub fn plan_moves(&self, files: &[FileRecord], suggestions: &[Suggestion]) -> Vec<MoveDirective> {
        file_organizer::plan_moves(files, suggestions)
    }

    pub fn execute_moves(
        &mut self,
        directives: &[MoveDirective],
        base: &Path,
    ) -> Result<Vec<MoveResult>> {
        file_organizer::execute_moves(&mut self.ledger, directives, base)
    }

    pub fn execute_moves_with_progress(
        &mut self,
        directives: &[MoveDirective],
        base: &Path,
        on_result: impl FnMut(&MoveResult),
    ) -> Result<Vec<MoveResult>> {
        file_organizer::execute_moves_with_progress(&mut self.ledger, directives, base, on_result)
    }

    pub fn undo_last(&mut self) -> UndoReport {
        undo::undo_last(&mut self.ledger)
    }

    /// Files the next undo would put back, and where.
    pub fn preview_undo(&self) -> Vec<(String, PathBuf)> {
        undo::preview_last(&self.ledger)
    }

    pub fn history_count(&self) -> usize {
        self.ledger.len()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.ledger.entries()
    }
}

/// First non-blank key: the stored one, else the fallback.
fn pick_api_key(
    stored: Option<String>,
    fallback: impl FnOnce() -> Option<String>,
) -> Option<String> {
    let non_blank = |key: &String| !key.trim().is_empty();
    stored.filter(non_blank).or_else(|| fallback().filter(non_blank))
}

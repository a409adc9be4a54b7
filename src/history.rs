//! The history ledger: one entry per move batch that moved at least one file.
//!
//! The ledger lives in the state file next to the API key. It is loaded once,
//! owned by the session, and written back after every append and every undo.

use crate::error::Result;
use crate::settings::SettingsStore;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single file moved by a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub name: String,
    /// Where the file was before the batch.
    pub from: PathBuf,
    /// Where the batch put it.
    pub to: PathBuf,
}

/// Every successful move of one batch, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub base_folder: PathBuf,
    pub moves: Vec<MoveRecord>,
}

impl HistoryEntry {
    pub fn new(base_folder: PathBuf) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            base_folder,
            moves: Vec::new(),
        }
    }

    pub fn record(&mut self, record: MoveRecord) {
        self.moves.push(record);
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Ordered list of past batches, most recent last.
#[derive(Debug)]
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
    store: Option<SettingsStore>,
}

impl HistoryLedger {
    /// Loads the ledger from the state file behind `store`.
    pub fn open(store: SettingsStore) -> Result<Self> {
        let entries = store.load()?.history;
        log::debug!(
            "loaded {} history entries from {}",
            entries.len(),
            store.path().display()
        );
        Ok(Self {
            entries,
            store: Some(store),
        })
    }

    /// A ledger that is never written anywhere.
    #[cfg(test)]
    pub(crate) fn in_memory() -> Self {
        Self {
            entries: Vec::new(),
            store: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Appends a batch and persists. Empty batches are ignored.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<()> {
        if entry.is_empty() {
            return Ok(());
        }
        self.entries.push(entry);
        self.persist()
    }

    /// Removes the most recent batch without persisting; the caller persists
    /// once it has finished with the entry.
    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop()
    }

    pub(crate) fn push_unsaved(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// Writes the in-memory entries to the state file, keeping every other
    /// field of it.
    pub fn persist(&self) -> Result<()> {
        match &self.store {
            Some(store) => store.update(|settings| settings.history = self.entries.clone()),
            None => Ok(()),
        }
    }
}

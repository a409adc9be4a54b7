//! The JSON state file: API key, move history, and whatever else was in it.
//!
//! The file is small and rewritten in full on every change. Writers go through
//! [`SettingsStore::update`], which re-reads the file and only replaces the
//! field being changed, so keys this version does not know about survive.

use crate::error::{Result, TidyError};
use crate::history::HistoryEntry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// In-memory image of the state file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    /// Unknown top-level keys, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reads and writes the state file at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the state file. A missing or blank file yields the defaults.
    pub fn load(&self) -> Result<Settings> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Settings::default()),
            Err(source) => {
                return Err(TidyError::StateRead {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        serde_json::from_str(&content).map_err(|source| TidyError::StateFormat {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrites the state file with `settings`.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| TidyError::StateWrite {
                path: self.path.clone(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(settings).map_err(|source| {
            TidyError::StateFormat {
                path: self.path.clone(),
                source,
            }
        })?;

        fs::write(&self.path, json).map_err(|source| TidyError::StateWrite {
            path: self.path.clone(),
            source,
        })
    }

    /// Read-modify-write of the state file.
    pub fn update(&self, change: impl FnOnce(&mut Settings)) -> Result<()> {
        let mut settings = self.load()?;
        change(&mut settings);
        self.save(&settings)
    }

    pub fn save_api_key(&self, api_key: &str) -> Result<()> {
        self.update(|settings| settings.api_key = Some(api_key.to_string()))?;
        log::info!("stored API key in {}", self.path.display());
        Ok(())
    }
}

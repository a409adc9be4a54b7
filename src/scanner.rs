//! Folder scanning: the top-level files of a folder, as [`FileRecord`]s.

use crate::config::ScanFilter;
use crate::error::{Result, TidyError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};

/// A file found by the scanner. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub name: String,
    /// Absolute path of the file at scan time.
    pub path: PathBuf,
    pub size: u64,
    /// Lowercase extension without the dot; empty when the file has none.
    pub extension: String,
    pub modified: DateTime<Utc>,
    /// MIME type sniffed from the file header, when recognized.
    pub mime_type: Option<String>,
}

impl FileRecord {
    fn from_entry(entry: &DirEntry, name: String) -> std::io::Result<Self> {
        let metadata = entry.metadata()?;
        let path = entry.path();

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let mime_type = infer::get_from_path(&path)
            .ok()
            .flatten()
            .map(|kind| kind.mime_type().to_string());

        Ok(Self {
            name,
            path,
            size: metadata.len(),
            extension,
            modified,
            mime_type,
        })
    }

    /// Size in the short form shown to the classifier and the user.
    pub fn human_size(&self) -> String {
        format_size(self.size)
    }
}

/// Formats a byte count as `B`, `KB`, `MB` or `GB` with one decimal.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b < KB => format!("{b} B"),
        b if b < MB => format!("{:.1} KB", b as f64 / KB as f64),
        b if b < GB => format!("{:.1} MB", b as f64 / MB as f64),
        b => format!("{:.1} GB", b as f64 / GB as f64),
    }
}

/// Resolves a user-supplied folder. `None` unless it names an existing
/// directory.
pub fn select_folder(path: &Path) -> Option<PathBuf> {
    fs::canonicalize(path).ok().filter(|resolved| resolved.is_dir())
}

/// Lists the regular files directly inside `folder` that `filter` accepts,
/// sorted by name.
///
/// Subdirectories and symlinks are skipped without recursion. An entry whose
/// metadata cannot be read is skipped with a warning.
///
/// # Errors
///
/// `ScanFailed` when the folder itself cannot be enumerated. An empty folder
/// is `Ok(vec![])`.
pub fn scan_folder(folder: &Path, filter: &ScanFilter) -> Result<Vec<FileRecord>> {
    let scan_failed = |source: std::io::Error| {
        log::error!("failed to scan folder {}: {}", folder.display(), source);
        TidyError::ScanFailed {
            path: folder.to_path_buf(),
            source,
        }
    };

    let folder_abs = std::path::absolute(folder).map_err(scan_failed)?;
    let entries = fs::read_dir(&folder_abs).map_err(scan_failed)?;

    let mut records = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("skipping unreadable entry in {}: {}", folder.display(), e);
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        if !filter.accepts(&name) {
            log::trace!("filtered out {name}");
            continue;
        }

        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        match FileRecord::from_entry(&entry, name) {
            Ok(record) => records.push(record),
            Err(e) => log::warn!("skipping {}: {}", entry.path().display(), e),
        }
    }

    records.sort_by(|a, b| a.name.cmp(&b.name));
    log::info!("scanned {} files in {}", records.len(), folder.display());
    Ok(records)
}

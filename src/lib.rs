//! tidyup - sort a folder with a language model, and take it back
//!
//! This library scans the top-level files of a folder, asks a classifier for a
//! destination subfolder per file, moves the accepted files, and keeps a
//! persisted history so the most recent batch can be undone.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod history;
pub mod logging;
pub mod openai;
pub mod output;
pub mod scanner;
pub mod session;
pub mod settings;
pub mod undo;

pub use classifier::{Classifier, Confidence, Suggestion};
pub use config::{AppConfig, ConfigError, ScanFilter};
pub use error::{Result, TidyError};
pub use file_category::HeuristicClassifier;
pub use file_organizer::{MoveDirective, MoveResult, execute_moves, plan_moves};
pub use history::{HistoryEntry, HistoryLedger, MoveRecord};
pub use scanner::{FileRecord, scan_folder};
pub use session::Session;
pub use settings::{Settings, SettingsStore};
pub use undo::{UndoReport, undo_last};

pub use cli::{Cli, run_cli};

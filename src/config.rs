//! TOML configuration for scanning, classification and state storage.
//!
//! Lookup order for the configuration file:
//! 1. the path given with `--config`
//! 2. `.tidyuprc.toml` in the current directory
//! 3. `<config dir>/tidyup/config.toml`
//! 4. built-in defaults
//!
//! ```toml
//! [scan.exclude]
//! filenames = ["Thumbs.db", "desktop.ini"]
//! patterns = ["*.part", "*.crdownload"]
//! extensions = ["tmp"]
//! regex = ["^~\\$"]
//!
//! [scan.include]
//! patterns = ["keep-*.tmp"]
//!
//! [classifier]
//! model = "gpt-4o-mini"
//! temperature = 0.3
//! max_tokens = 2000
//! timeout_secs = 60
//!
//! [state]
//! path = "/home/me/.tidyup-state.json"
//! ```
//!
//! Hidden files are never scanned; include patterns only override the
//! exclude rules.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const LOCAL_CONFIG_FILE: &str = ".tidyuprc.toml";
const APP_DIR: &str = "tidyup";

/// Errors raised while loading or compiling the configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid configuration in {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("IO error reading configuration {}: {reason}", path.display())]
    Io { path: PathBuf, reason: String },

    #[error("Could not determine where to keep the state file; pass --state")]
    NoStateLocation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scan: ScanRules,
    pub classifier: ClassifierSettings,
    pub state: StateSettings,
}

/// Which top-level files the scanner hands to the classifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanRules {
    pub exclude: ExcludeRules,
    pub include: IncludeRules,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludeRules {
    /// Exact file names, e.g. "Thumbs.db".
    pub filenames: Vec<String>,
    /// Glob patterns matched against the file name.
    pub patterns: Vec<String>,
    /// Extensions without the dot, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Regexes matched against the file name.
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IncludeRules {
    pub patterns: Vec<String>,
}

/// Settings for the remote chat-completions classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 2000,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSettings {
    /// Overrides the default `<config dir>/tidyup/settings.json`.
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Loads the configuration following the lookup order in the module docs.
    ///
    /// # Errors
    ///
    /// Fails when an explicitly given file is missing, or when any file that
    /// is found cannot be read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Self::load_from_file(&local);
        }

        if let Some(user) = user_config_file()
            && user.is_file()
        {
            return Self::load_from_file(&user);
        }

        log::debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        log::debug!("loading configuration from {}", path.display());
        toml::from_str(&content).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Location of the JSON state file: the configured override or the
    /// per-user default.
    pub fn state_path(&self) -> Option<PathBuf> {
        self.state
            .path
            .clone()
            .or_else(|| dirs::config_dir().map(|dir| dir.join(APP_DIR).join("settings.json")))
    }
}

fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

impl ScanRules {
    /// Validates and compiles every pattern so matching never reparses.
    ///
    /// # Errors
    ///
    /// Returns the first invalid glob or regex.
    pub fn compile(&self) -> Result<ScanFilter, ConfigError> {
        let compile_globs = |patterns: &[String]| {
            patterns
                .iter()
                .map(|p| Pattern::new(p).map_err(|_| ConfigError::InvalidGlobPattern(p.clone())))
                .collect::<Result<Vec<_>, _>>()
        };

        let regexes = self
            .exclude
            .regex
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ScanFilter {
            filenames: self.exclude.filenames.iter().cloned().collect(),
            extensions: self
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_globs: compile_globs(&self.exclude.patterns)?,
            regexes,
            include_globs: compile_globs(&self.include.patterns)?,
        })
    }
}

/// Compiled form of [`ScanRules`].
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    filenames: HashSet<String>,
    extensions: HashSet<String>,
    exclude_globs: Vec<Pattern>,
    regexes: Vec<Regex>,
    include_globs: Vec<Pattern>,
}

impl ScanFilter {
    /// Whether a top-level file with this name should be scanned.
    pub fn accepts(&self, file_name: &str) -> bool {
        if file_name.starts_with('.') {
            return false;
        }

        if self.include_globs.iter().any(|g| g.matches(file_name)) {
            return true;
        }

        if self.filenames.contains(file_name) {
            return false;
        }

        if let Some(ext) = Path::new(file_name).extension()
            && self
                .extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        let excluded_by_glob = self.exclude_globs.iter().any(|g| g.matches(file_name));
        !excluded_by_glob && !self.regexes.iter().any(|r| r.is_match(file_name))
    }
}

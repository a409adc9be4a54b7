//! The classifier boundary.
//!
//! A [`Classifier`] turns scanned files into folder suggestions. Everything it
//! returns is untrusted: names are matched back against the scan before any
//! move is planned, and the confidence tag is display data only.

use crate::error::{Result, TidyError};
use crate::scanner::FileRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// How sure the classifier claims to be. Unknown values are kept verbatim,
/// whatever their JSON type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "String")]
pub enum Confidence {
    High,
    Medium,
    Low,
    Unrecognized(String),
}

impl From<String> for Confidence {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<Value> for Confidence {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::from(text),
            other => Self::Unrecognized(render(other)),
        }
    }
}

impl From<Confidence> for String {
    fn from(value: Confidence) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => f.write_str("high"),
            Self::Medium => f.write_str("medium"),
            Self::Low => f.write_str("low"),
            Self::Unrecognized(other) => f.write_str(other),
        }
    }
}

fn unknown_confidence() -> Confidence {
    Confidence::Unrecognized(String::new())
}

/// Display text for a JSON value; `null` renders as nothing.
fn render(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(render)
}

/// One entry of a classifier reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    /// Destination relative to the scanned folder, e.g. "Documents/Invoices".
    pub folder: String,
    #[serde(default = "unknown_confidence")]
    pub confidence: Confidence,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reason: String,
}

/// Proposes a destination subfolder for each file.
pub trait Classifier {
    /// # Errors
    ///
    /// A single batch-level error when the proposal cannot be produced; there
    /// are no partial results.
    fn classify(&self, files: &[FileRecord]) -> Result<Vec<Suggestion>>;
}

/// The instruction sent with every remote classification request.
pub fn build_prompt(files: &[FileRecord]) -> String {
    let file_list = files
        .iter()
        .map(|f| {
            let ext = if f.extension.is_empty() {
                "no extension".to_string()
            } else {
                format!(".{}", f.extension)
            };
            format!("{} ({}, {})", f.name, ext, f.human_size())
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a file organization assistant. Analyze these files and suggest which folder each should go into.

Files to organize:
{file_list}

Respond with a JSON array where each object has:
- "name": the filename
- "folder": suggested folder path (e.g., "Documents/Invoices", "Images/Screenshots", "Music", "Videos", "Archives", "Code", "Other")
- "confidence": "high", "medium", or "low"
- "reason": brief reason for the suggestion

Be smart about categorization:
- Receipts, invoices, statements → Documents/Finance
- Screenshots → Images/Screenshots
- Photos with dates → Images/Photos/[Year]
- Music files → Music/[Artist if detectable]
- Code files (.js, .py, .ts, etc) → Code
- Archives (.zip, .tar, etc) → Archives
- Installers (.dmg, .exe, .pkg) → Installers

Respond ONLY with valid JSON array, no other text."#
    )
}

/// Parses a model reply into suggestions, tolerating markdown fences and
/// prose around the array.
pub fn parse_suggestions(reply: &str) -> Result<Vec<Suggestion>> {
    extract_json(reply).map_err(TidyError::Classifier)
}

/// Finds the JSON payload in a model reply.
///
/// Tries the whole reply, then the reply without code fences, then the
/// outermost `[...]` span.
pub fn extract_json<T: DeserializeOwned>(reply: &str) -> std::result::Result<T, String> {
    let trimmed = reply.trim();

    if let Ok(parsed) = serde_json::from_str::<T>(trimmed) {
        return Ok(parsed);
    }

    let unfenced = strip_code_fence(trimmed);
    if let Ok(parsed) = serde_json::from_str::<T>(unfenced) {
        return Ok(parsed);
    }

    if let Some(span) = outermost_array(unfenced) {
        return serde_json::from_str::<T>(span)
            .map_err(|e| format!("invalid JSON in model reply: {e}"));
    }

    Err(format!(
        "no JSON array in model reply: {}...",
        trimmed.chars().take(200).collect::<String>()
    ))
}

fn strip_code_fence(text: &str) -> &str {
    let body = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    body.trim().strip_suffix("```").unwrap_or(body).trim()
}

/// The span from the first `[` to the last `]`.
fn outermost_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

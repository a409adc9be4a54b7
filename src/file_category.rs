/// Offline classification by MIME type, extension and a few name hints.
///
/// Produces the same folder vocabulary the remote prompt asks for, so a run
/// with `--offline` looks like a run against the model, just less clever.
///
/// # Examples
///
/// ```
/// use tidyup::file_category::{Category, FileMapper};
///
/// let mapper = FileMapper::default();
/// assert_eq!(mapper.categorize(Some("image/png"), "png"), Some(Category::Images));
/// assert_eq!(mapper.categorize(None, "dmg"), Some(Category::Installers));
/// assert_eq!(mapper.categorize(None, "xyz"), None);
/// ```
use crate::classifier::{Classifier, Confidence, Suggestion};
use crate::error::Result;
use crate::scanner::FileRecord;
use std::collections::HashMap;

/// Top-level destination folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Documents,
    Images,
    Music,
    Videos,
    Archives,
    Code,
    Installers,
    Other,
}

impl Category {
    pub fn folder(&self) -> &'static str {
        match self {
            Category::Documents => "Documents",
            Category::Images => "Images",
            Category::Music => "Music",
            Category::Videos => "Videos",
            Category::Archives => "Archives",
            Category::Code => "Code",
            Category::Installers => "Installers",
            Category::Other => "Other",
        }
    }
}

const EXTENSIONS: &[(Category, &[&str])] = &[
    (
        Category::Documents,
        &[
            "pdf", "txt", "doc", "docx", "rtf", "odt", "md", "pages", "csv", "xls", "xlsx",
            "ods", "numbers", "ppt", "pptx", "odp", "key", "epub",
        ],
    ),
    (
        Category::Images,
        &[
            "png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "tiff", "heic", "heif", "ico",
            "raw",
        ],
    ),
    (
        Category::Music,
        &["mp3", "wav", "ogg", "flac", "aac", "m4a", "wma", "aiff"],
    ),
    (
        Category::Videos,
        &["mp4", "mkv", "avi", "mov", "flv", "wmv", "webm", "3gp", "m4v"],
    ),
    (
        Category::Archives,
        &["zip", "rar", "7z", "tar", "gz", "tgz", "bz2", "xz"],
    ),
    (
        Category::Code,
        &[
            "js", "ts", "py", "rs", "go", "java", "c", "cpp", "h", "hpp", "rb", "php", "sh",
            "html", "css", "json", "xml", "yaml", "yml", "toml", "sql", "ipynb",
        ],
    ),
    (
        Category::Installers,
        &["dmg", "exe", "pkg", "msi", "deb", "rpm", "appimage", "apk"],
    ),
];

const INSTALLER_MIMES: &[&str] = &[
    "application/x-apple-diskimage",
    "application/vnd.microsoft.portable-executable",
    "application/x-msdownload",
    "application/vnd.debian.binary-package",
    "application/x-rpm",
    "application/vnd.android.package-archive",
];

const ARCHIVE_MIMES: &[&str] = &[
    "application/zip",
    "application/x-rar-compressed",
    "application/vnd.rar",
    "application/x-7z-compressed",
    "application/x-tar",
    "application/gzip",
    "application/x-bzip2",
    "application/x-xz",
];

const FINANCE_HINTS: &[&str] = &["invoice", "receipt", "statement", "bill", "tax"];
const SCREENSHOT_HINTS: &[&str] = &["screenshot", "screen shot", "bildschirmfoto"];

/// Maps MIME types and extensions to categories.
#[derive(Debug, Clone)]
pub struct FileMapper {
    mime_map: HashMap<String, Category>,
    extension_map: HashMap<String, Category>,
}

impl FileMapper {
    pub fn new() -> Self {
        let mut mapper = Self {
            mime_map: HashMap::new(),
            extension_map: HashMap::new(),
        };

        for (category, extensions) in EXTENSIONS {
            for ext in *extensions {
                mapper.add_extension_mapping(ext, *category);
            }
        }
        for mime in INSTALLER_MIMES {
            mapper.add_mime_mapping(mime, Category::Installers);
        }
        for mime in ARCHIVE_MIMES {
            mapper.add_mime_mapping(mime, Category::Archives);
        }
        mapper.add_mime_mapping("application/pdf", Category::Documents);
        mapper.add_mime_mapping("application/epub+zip", Category::Documents);

        mapper
    }

    pub fn add_mime_mapping(&mut self, mime: &str, category: Category) {
        self.mime_map.insert(mime.to_lowercase(), category);
    }

    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        self.extension_map.insert(ext.to_lowercase(), category);
    }

    /// Exact MIME matches first, then the MIME family (`image/*`, `audio/*`,
    /// `video/*`), then the extension.
    pub fn categorize(&self, mime_type: Option<&str>, ext: &str) -> Option<Category> {
        if let Some(mime) = mime_type.map(str::to_lowercase) {
            if let Some(category) = self.mime_map.get(&mime) {
                return Some(*category);
            }
            let family = match mime.split('/').next() {
                Some("image") => Some(Category::Images),
                Some("audio") => Some(Category::Music),
                Some("video") => Some(Category::Videos),
                _ => None,
            };
            if family.is_some() {
                return family;
            }
        }

        self.extension_map.get(&ext.to_lowercase()).copied()
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Classifier`] that never leaves the machine.
#[derive(Debug, Clone, Default)]
pub struct HeuristicClassifier {
    mapper: FileMapper,
}

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn suggest(&self, file: &FileRecord) -> Suggestion {
        let lower_name = file.name.to_lowercase();
        let has_hint = |hints: &[&str]| hints.iter().any(|hint| lower_name.contains(hint));

        let category = self.mapper.categorize(file.mime_type.as_deref(), &file.extension);
        let (folder, confidence, reason) = match category {
            Some(Category::Images) if has_hint(SCREENSHOT_HINTS) => (
                "Images/Screenshots".to_string(),
                Confidence::High,
                "Image named like a screenshot".to_string(),
            ),
            Some(Category::Documents) if has_hint(FINANCE_HINTS) => (
                "Documents/Finance".to_string(),
                Confidence::Medium,
                "Document named like a financial record".to_string(),
            ),
            Some(category) => {
                let confidence = if file.mime_type.is_some() {
                    Confidence::High
                } else {
                    Confidence::Medium
                };
                let basis = if file.mime_type.is_some() {
                    "content type"
                } else {
                    "extension"
                };
                (
                    category.folder().to_string(),
                    confidence,
                    format!("Matched {} by {basis}", category.folder()),
                )
            }
            None => (
                Category::Other.folder().to_string(),
                Confidence::Low,
                "No known type".to_string(),
            ),
        };

        Suggestion {
            name: file.name.clone(),
            folder,
            confidence,
            reason,
        }
    }
}

impl Classifier for HeuristicClassifier {
    fn classify(&self, files: &[FileRecord]) -> Result<Vec<Suggestion>> {
        Ok(files.iter().map(|file| self.suggest(file)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;

    fn record(name: &str, extension: &str, mime: Option<&str>) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            path: PathBuf::from("/downloads").join(name),
            size: 1,
            extension: extension.to_string(),
            modified: Utc::now(),
            mime_type: mime.map(str::to_string),
        }
    }

    #[test]
    fn test_mime_takes_priority_over_extension() {
        let mapper = FileMapper::default();
        assert_eq!(
            mapper.categorize(Some("image/png"), "txt"),
            Some(Category::Images)
        );
        assert_eq!(
            mapper.categorize(Some("application/zip"), "docx"),
            Some(Category::Archives)
        );
    }

    #[test]
    fn test_mime_family_fallback() {
        let mapper = FileMapper::default();
        assert_eq!(
            mapper.categorize(Some("audio/x-unknown"), ""),
            Some(Category::Music)
        );
        assert_eq!(
            mapper.categorize(Some("VIDEO/MP4"), ""),
            Some(Category::Videos)
        );
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.categorize(None, "PDF"), Some(Category::Documents));
        assert_eq!(mapper.categorize(None, "Rs"), Some(Category::Code));
    }

    #[test]
    fn test_classifier_name_hints() {
        let classifier = HeuristicClassifier::new();
        let suggestions = classifier
            .classify(&[
                record("Screenshot 2024-01-02.png", "png", Some("image/png")),
                record("invoice-0042.pdf", "pdf", None),
                record("setup.dmg", "dmg", None),
                record("mystery.bin", "bin", None),
            ])
            .unwrap();

        let folders: Vec<_> = suggestions.iter().map(|s| s.folder.as_str()).collect();
        assert_eq!(
            folders,
            vec!["Images/Screenshots", "Documents/Finance", "Installers", "Other"]
        );
        assert_eq!(suggestions[2].confidence, Confidence::Medium);
        assert_eq!(suggestions[3].confidence, Confidence::Low);
    }

    #[test]
    fn test_classifier_keeps_names_and_order() {
        let files = vec![record("b.mp3", "mp3", None), record("a.zip", "zip", None)];
        let suggestions = HeuristicClassifier::new().classify(&files).unwrap();
        assert_eq!(suggestions[0].name, "b.mp3");
        assert_eq!(suggestions[1].name, "a.zip");
    }
}

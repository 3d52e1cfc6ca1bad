//! File category detection by extension

use serde::{Deserialize, Serialize};

/// Broad kind of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Text,
    Document,
    Spreadsheet,
    Image,
    Audio,
    Video,
    Code,
    Unknown,
}

/// Extension lists, checked in order; the first match wins
const CATEGORY_EXTENSIONS: &[(FileCategory, &[&str])] = &[
    (FileCategory::Text, &["txt", "md", "json", "csv"]),
    (FileCategory::Document, &["pdf", "docx", "doc"]),
    (FileCategory::Spreadsheet, &["xlsx", "xls", "csv"]),
    (FileCategory::Image, &["jpg", "jpeg", "png", "gif", "webp"]),
    (FileCategory::Audio, &["mp3", "wav", "ogg", "webm"]),
    (FileCategory::Video, &["mp4", "avi", "mov", "webm"]),
    (
        FileCategory::Code,
        &[
            "js", "jsx", "ts", "tsx", "py", "java", "cpp", "c", "html", "css", "php", "rb", "go",
            "rs", "swift", "kt",
        ],
    ),
];

/// Lower-cased text after the last `.`, or the whole name if there is none
pub fn extension(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_lowercase()
}

impl FileCategory {
    pub fn from_name(name: &str) -> Self {
        let ext = extension(name);
        CATEGORY_EXTENSIONS
            .iter()
            .find(|(_, extensions)| extensions.contains(&ext.as_str()))
            .map(|(category, _)| *category)
            .unwrap_or(FileCategory::Unknown)
    }

    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Text => "text",
            FileCategory::Document => "document",
            FileCategory::Spreadsheet => "spreadsheet",
            FileCategory::Image => "image",
            FileCategory::Audio => "audio",
            FileCategory::Video => "video",
            FileCategory::Code => "code",
            FileCategory::Unknown => "unknown",
        }
    }

    /// Whether text can be pulled out of files in this category
    pub fn is_extractable(&self) -> bool {
        matches!(
            self,
            FileCategory::Text
                | FileCategory::Document
                | FileCategory::Spreadsheet
                | FileCategory::Code
        )
    }
}

//! Document and content extraction
//!
//! Converts uploaded text, code, spreadsheet, word-processor and PDF files
//! into plain text. Uploads are validated before any parsing happens, and
//! every validation problem is reported, not just the first.

pub mod category;
pub mod docx;
pub mod helpers;
pub mod pdf;
pub mod spreadsheet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub use category::FileCategory;
pub use helpers::{CodeBlock, extract_code_blocks, format_file_size, preview, sanitize_file_name};

/// Default upload ceiling (10 MiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// PDFs smaller than this cannot be well-formed
pub const MIN_PDF_BYTES: u64 = 100;

/// Extraction failure for a single file
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("Unsupported file type")]
    UnsupportedFileType,

    #[error("Unsupported document format")]
    UnsupportedDocument,

    #[error("PDF processing failed: {0}")]
    Pdf(String),

    #[error("Spreadsheet processing failed: {0}")]
    Spreadsheet(String),

    #[error("Word document processing failed: {0}")]
    Docx(String),
}

/// Problems that make an upload unacceptable before extraction
pub fn validate(name: &str, byte_size: u64, max_bytes: u64) -> Vec<String> {
    let mut errors = Vec::new();

    if byte_size > max_bytes {
        errors.push(format!(
            "File size exceeds {} limit",
            format_file_size(max_bytes)
        ));
    }
    if byte_size == 0 {
        errors.push("File is empty".to_string());
    }
    if FileCategory::from_name(name) == FileCategory::Unknown {
        errors.push("Unsupported file type".to_string());
    }
    if category::extension(name) == "pdf" && byte_size < MIN_PDF_BYTES {
        errors.push("PDF file appears to be corrupted or too small".to_string());
    }

    errors
}

/// Text content of a file, chosen by its category
pub fn extract_text(name: &str, bytes: &[u8]) -> Result<String, ExtractError> {
    match FileCategory::from_name(name) {
        FileCategory::Text | FileCategory::Code => Ok(String::from_utf8_lossy(bytes).into_owned()),
        FileCategory::Spreadsheet => spreadsheet::extract(bytes),
        FileCategory::Document => match category::extension(name).as_str() {
            "pdf" => pdf::extract(bytes),
            "docx" => docx::extract(bytes),
            _ => Err(ExtractError::UnsupportedDocument),
        },
        FileCategory::Image | FileCategory::Audio | FileCategory::Video | FileCategory::Unknown => {
            Err(ExtractError::UnsupportedFileType)
        }
    }
}

/// An uploaded file and its extracted text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedDocument {
    pub id: Uuid,
    pub name: String,
    pub byte_size: u64,
    pub category: FileCategory,
    pub extracted_text: String,
    pub preview: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Extract a file into a new [`ExtractedDocument`]
///
/// Does not validate; call [`validate`] first.
pub fn extract(name: &str, bytes: &[u8]) -> Result<ExtractedDocument, ExtractError> {
    let category = FileCategory::from_name(name);
    let extracted_text = extract_text(name, bytes)?;

    tracing::debug!(
        name = %name,
        category = category.as_str(),
        byte_size = bytes.len(),
        text_length = extracted_text.len(),
        "Extracted document text"
    );

    Ok(ExtractedDocument {
        id: Uuid::new_v4(),
        name: name.to_string(),
        byte_size: bytes.len() as u64,
        category,
        preview: preview(&extracted_text),
        extracted_text,
        uploaded_at: Utc::now(),
    })
}

/// Outcome for one file of a batch
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Extracted(ExtractedDocument),
    Rejected { name: String, errors: Vec<String> },
    Failed { name: String, error: ExtractError },
}

/// Validate and extract several files in order, one outcome per file
pub fn extract_batch<'a, I>(files: I, max_bytes: u64) -> Vec<BatchOutcome>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    files
        .into_iter()
        .map(|(name, bytes)| {
            let errors = validate(name, bytes.len() as u64, max_bytes);
            if !errors.is_empty() {
                return BatchOutcome::Rejected {
                    name: name.to_string(),
                    errors,
                };
            }
            match extract(name, bytes) {
                Ok(document) => BatchOutcome::Extracted(document),
                Err(error) => {
                    tracing::warn!(name = %name, error = %error, "Batch extraction failed");
                    BatchOutcome::Failed {
                        name: name.to_string(),
                        error,
                    }
                }
            }
        })
        .collect()
}

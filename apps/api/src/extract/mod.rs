// Document text extraction.
// Implements: extension-based format dispatch and per-format readers
// (plain text, delimited tables, Word .docx, PDF).

pub mod docx;
pub mod tabular;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to parse document: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Upload formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Txt,
    Csv,
    Tsv,
    /// Legacy binary Word. Accepted at upload, never extracted.
    Doc,
    Docx,
    Pdf,
}

impl DocumentFormat {
    /// Case-insensitive lookup by bare extension (no dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "doc" => Some(Self::Doc),
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Uses the text after the last `.`; names without one have no format.
    pub fn from_filename(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }
}

/// Reads a stored upload and returns its plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path, format: DocumentFormat) -> Result<String, ExtractError>;
}

/// Default extractor backed by the local filesystem.
pub struct FileTextExtractor;

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract(&self, path: &Path, format: DocumentFormat) -> Result<String, ExtractError> {
        if format == DocumentFormat::Doc {
            // No .doc converter is available.
            return Err(ExtractError::UnsupportedFormat(
                "legacy .doc files are not supported; save as .docx".to_string(),
            ));
        }

        let data = tokio::fs::read(path).await?;
        debug!(bytes = data.len(), format = format.extension(), "Extracting text");

        // Zip inflation and PDF parsing are CPU-bound.
        tokio::task::spawn_blocking(move || extract_bytes(&data, format))
            .await
            .map_err(|e| ExtractError::Parse(format!("extraction task failed: {e}")))?
    }
}

/// Synchronous per-format dispatch over raw file bytes.
pub fn extract_bytes(data: &[u8], format: DocumentFormat) -> Result<String, ExtractError> {
    match format {
        DocumentFormat::Txt => String::from_utf8(data.to_vec())
            .map_err(|e| ExtractError::Parse(format!("text file is not valid UTF-8: {e}"))),
        DocumentFormat::Csv => tabular::extract_delimited(data, b','),
        DocumentFormat::Tsv => tabular::extract_delimited(data, b'\t'),
        DocumentFormat::Docx => docx::extract_docx(data),
        DocumentFormat::Pdf => pdf_extract::extract_text_from_mem(data)
            .map_err(|e| ExtractError::Parse(format!("PDF extraction failed: {e}"))),
        DocumentFormat::Doc => Err(ExtractError::UnsupportedFormat(
            "legacy .doc files are not supported; save as .docx".to_string(),
        )),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

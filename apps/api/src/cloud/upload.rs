//! Upload intake: multipart field extraction, filename sanitising, on-disk storage.

use std::path::Path;

use axum::extract::Multipart;
use bytes::Bytes;
use tempfile::TempPath;
use tracing::debug;

use crate::errors::AppError;
use crate::extract::DocumentFormat;

/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Bytes,
}

impl UploadedFile {
    /// Format by extension of the client-supplied name.
    pub fn format(&self) -> Result<DocumentFormat, AppError> {
        DocumentFormat::from_filename(&self.filename).ok_or_else(|| {
            AppError::UnsupportedFile(format!("extension not allowed: '{}'", self.filename))
        })
    }
}

/// Reads the `file` field. `Ok(None)` when it is missing or has an empty filename.
pub async fn read_file_field(multipart: &mut Multipart) -> Result<Option<UploadedFile>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read multipart: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Ok(None);
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
        debug!(filename = %filename, bytes = data.len(), "File upload received");
        return Ok(Some(UploadedFile { filename, data }));
    }
    Ok(None)
}

/// Reduces a client filename to a safe single path component.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
/// Directory parts and leading dots are removed.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Writes the upload under `dir` as `upload-<random>-<sanitised name>`.
///
/// The returned guard deletes the file when dropped or closed; callers keep it
/// only as long as extraction needs the file.
pub async fn store_upload(dir: &Path, upload: &UploadedFile) -> Result<TempPath, AppError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("creating upload dir")))?;
    let path = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&format!("-{}", sanitize_filename(&upload.filename)))
        .tempfile_in(dir)
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("creating upload file")))?
        .into_temp_path();
    tokio::fs::write(&path, &upload.data)
        .await
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("storing upload")))?;
    debug!(path = %path.display(), "Upload stored");
    Ok(path)
}

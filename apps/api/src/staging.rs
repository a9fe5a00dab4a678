//! Per-request temporary storage for uploaded resumes.
//!
//! Uploads are streamed to disk chunk by chunk inside a private `TempDir`.
//! The directory is removed when the staging area drops, whatever the exit
//! path. [`UploadStaging::close`] does the same but logs deletion faults.

use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::analysis::batch::BatchInput;
use crate::analysis::verdict::ErrorVerdict;
use crate::errors::AppError;
use crate::extraction::{DocumentFormat, RawDocument};

#[derive(Debug, Clone)]
pub struct StagedFile {
    pub filename: String,
    pub format: DocumentFormat,
    pub size: u64,
    path: PathBuf,
}

pub struct UploadStaging {
    dir: TempDir,
    staged: usize,
}

impl UploadStaging {
    pub fn new() -> Result<Self, AppError> {
        let dir = tempfile::Builder::new()
            .prefix("resume-upload-")
            .tempdir()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create upload dir: {e}")))?;
        Ok(Self { dir, staged: 0 })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Streams one multipart file field to disk.
    pub async fn stage_field(&mut self, mut field: Field<'_>) -> Result<StagedFile, AppError> {
        let filename = sanitize_filename(field.file_name().unwrap_or("upload"));
        let format = DocumentFormat::from_declared(field.content_type(), &filename);

        // Prefix with a counter so identically named uploads do not collide.
        let path = self.dir.path().join(format!("{:04}-{filename}", self.staged));
        self.staged += 1;

        let mut file = tokio::fs::File::create(&path).await.map_err(internal)?;
        let mut size = 0u64;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file '{filename}': {e}")))?
        {
            file.write_all(&chunk).await.map_err(internal)?;
            size += chunk.len() as u64;
        }
        file.flush().await.map_err(internal)?;

        debug!(filename = %filename, format = ?format, bytes = size, "Upload staged");

        Ok(StagedFile {
            filename,
            format,
            size,
            path,
        })
    }

    pub async fn load(&self, file: &StagedFile) -> Result<RawDocument, AppError> {
        let bytes = tokio::fs::read(&file.path).await.map_err(internal)?;
        Ok(RawDocument::new(file.filename.clone(), file.format, bytes))
    }

    /// Loads every staged file for a batch. A file that cannot be read is
    /// recorded at its position as an internal failure instead of aborting
    /// its siblings.
    pub async fn load_batch(&self, files: &[StagedFile]) -> Vec<BatchInput> {
        let mut inputs = Vec::with_capacity(files.len());
        for file in files {
            let input = match self.load(file).await {
                Ok(document) => BatchInput::Loaded(document),
                Err(e) => {
                    warn!(filename = %file.filename, "Failed to load staged upload: {e}");
                    BatchInput::Unloadable {
                        filename: file.filename.clone(),
                        error: ErrorVerdict::internal(e.to_string()),
                    }
                }
            };
            inputs.push(input);
        }
        inputs
    }

    /// Removes the staging directory, logging rather than surfacing faults.
    pub fn close(self) {
        let path = self.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!(path = %path.display(), "Failed to remove temporary uploads: {e}");
        }
    }
}

fn internal(e: std::io::Error) -> AppError {
    AppError::Internal(anyhow::anyhow!("Upload staging I/O error: {e}"))
}

/// Keeps only the final path component of a client-supplied name.
fn sanitize_filename(raw: &str) -> String {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_start_matches('.');

    if name.is_empty() {
        "upload".to_string()
    } else {
        name.to_string()
    }
}

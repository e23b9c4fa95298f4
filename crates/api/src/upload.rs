//! Multipart body collection for runner protocol endpoints.
//!
//! Runners send `update` and `success` bodies as multipart forms: text
//! fields plus optional file parts (produced media, live chunks). File
//! parts are spooled under `STORAGE_DIR/tmp` first; handlers validate the
//! text fields and only then move spooled files to their final location.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// One spooled file part.
#[derive(Debug)]
pub struct SpooledFile {
    /// Form field name, e.g. `payload[videoFile]`.
    pub field: String,
    /// Client-declared filename, unused for trust decisions.
    pub filename: Option<String>,
    /// Location in the spool directory.
    pub path: PathBuf,
    pub size: u64,
}

/// A fully collected multipart form.
#[derive(Debug, Default)]
pub struct RunnerForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<SpooledFile>,
}

impl RunnerForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// A field that must be present, else 400.
    pub fn require_field(&self, name: &str) -> AppResult<&str> {
        self.field(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing field '{name}'")))
    }

    pub fn file(&self, field: &str) -> Option<&SpooledFile> {
        self.files.iter().find(|f| f.field == field)
    }

    /// Delete every spooled file. Called on validation failure so aborted
    /// uploads do not accumulate.
    pub async fn discard(self) {
        for file in self.files {
            let _ = tokio::fs::remove_file(&file.path).await;
        }
    }
}

/// Drain a multipart body into text fields and spooled files.
pub async fn collect_form(mut multipart: Multipart, spool_dir: &Path) -> AppResult<RunnerForm> {
    tokio::fs::create_dir_all(spool_dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Cannot create spool directory: {e}")))?;

    let mut form = RunnerForm::default();

    while let Some(mut part) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let Some(name) = part.name().map(str::to_string) else {
            return Err(AppError::BadRequest("Unnamed multipart field".into()));
        };

        if part.file_name().is_some() {
            let filename = part.file_name().map(str::to_string);
            let path = spool_dir.join(Uuid::new_v4().to_string());
            let mut out = tokio::fs::File::create(&path)
                .await
                .map_err(|e| AppError::InternalError(format!("Cannot spool upload: {e}")))?;

            let mut size: u64 = 0;
            while let Some(chunk) = part
                .chunk()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
            {
                size += chunk.len() as u64;
                out.write_all(&chunk)
                    .await
                    .map_err(|e| AppError::InternalError(format!("Cannot spool upload: {e}")))?;
            }
            out.flush()
                .await
                .map_err(|e| AppError::InternalError(format!("Cannot spool upload: {e}")))?;

            form.files.push(SpooledFile {
                field: name,
                filename,
                path,
                size,
            });
        } else {
            let value = part
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

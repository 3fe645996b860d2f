use std::path::{Path, PathBuf};

use shared::domain::{ArchiveFilename, TemplateId, UserFile};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiFailure, MinutesApi};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArchiveError {
    #[error("{0} is not in the archive listing")]
    UnknownFile(ArchiveFilename),
    #[error("no file is open")]
    NothingToSave,
    #[error("another file was opened before {0} finished loading")]
    Superseded(ArchiveFilename),
    #[error("failed to write {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error(transparent)]
    Api(#[from] ApiFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTicket {
    pub filename: ArchiveFilename,
    seq: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FileArchive {
    files: Vec<UserFile>,
    selected: Option<ArchiveFilename>,
    loading: bool,
    preview: Option<Vec<u8>>,
    error: Option<String>,
    seq: u64,
}

impl FileArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[UserFile] {
        &self.files
    }

    pub fn selected(&self) -> Option<&ArchiveFilename> {
        self.selected.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn preview(&self) -> Option<&[u8]> {
        self.preview.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn refresh(&mut self, files: Vec<UserFile>) {
        let still_listed = self
            .selected
            .as_ref()
            .is_some_and(|selected| files.iter().any(|file| &file.filename == selected));
        if !still_listed {
            self.close_preview();
        }
        debug!(count = files.len(), "archive listing refreshed");
        self.files = files;
    }

    pub fn open(&mut self, filename: &ArchiveFilename) -> Result<OpenTicket, ArchiveError> {
        if !self.files.iter().any(|file| &file.filename == filename) {
            return Err(ArchiveError::UnknownFile(filename.clone()));
        }
        self.seq += 1;
        self.selected = Some(filename.clone());
        self.loading = true;
        self.preview = None;
        self.error = None;
        Ok(OpenTicket {
            filename: filename.clone(),
            seq: self.seq,
        })
    }

    /// Applies a download only if the same open request is still current.
    pub fn finish_open(
        &mut self,
        ticket: OpenTicket,
        result: Result<Vec<u8>, ApiFailure>,
    ) -> Result<&[u8], ArchiveError> {
        if ticket.seq != self.seq || self.selected.as_ref() != Some(&ticket.filename) {
            warn!(filename = %ticket.filename, "discarding download for a file no longer selected");
            return Err(ArchiveError::Superseded(ticket.filename));
        }
        self.loading = false;
        match result {
            Ok(bytes) => {
                self.error = None;
                Ok(self.preview.insert(bytes).as_slice())
            }
            Err(failure) => {
                self.error = Some(failure.to_string());
                Err(failure.into())
            }
        }
    }

    pub fn close_preview(&mut self) {
        self.seq += 1;
        self.selected = None;
        self.loading = false;
        self.preview = None;
        self.error = None;
    }

    pub async fn save_to(&self, path: &Path) -> Result<(), ArchiveError> {
        let bytes = self.preview.as_deref().ok_or(ArchiveError::NothingToSave)?;
        write_pdf(path, bytes).await
    }

    pub async fn refresh_from(&mut self, api: &dyn MinutesApi) -> Result<&[UserFile], ApiFailure> {
        let files = api.list_user_files().await?;
        self.refresh(files);
        Ok(&self.files)
    }

    pub async fn open_from(
        &mut self,
        api: &dyn MinutesApi,
        filename: &ArchiveFilename,
    ) -> Result<&[u8], ArchiveError> {
        let ticket = self.open(filename)?;
        let result = api.fetch_file(filename).await;
        self.finish_open(ticket, result)
    }
}

pub async fn write_pdf(path: &Path, bytes: &[u8]) -> Result<(), ArchiveError> {
    let io_error = |err: std::io::Error| ArchiveError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }
    tokio::fs::write(path, bytes).await.map_err(io_error)?;
    info!(path = %path.display(), size = bytes.len(), "pdf saved");
    Ok(())
}

pub fn template_label(template: Option<&TemplateId>) -> String {
    match template.map(TemplateId::as_str) {
        Some("professional") => "Professional".to_string(),
        Some("minimal") => "Minimal".to_string(),
        Some("modern") => "Modern".to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

pub fn format_created_at(file: &UserFile) -> String {
    file.created_at_parsed()
        .map(|created| created.format("%b %d, %Y %H:%M").to_string())
        .unwrap_or_else(|| "Unknown date".to_string())
}

#[cfg(test)]
#[path = "tests/archive_tests.rs"]
mod tests;

use std::path::Path;

use async_trait::async_trait;
use shared::{
    domain::{AiConfig, ArchiveFilename, MinutesDocument, PdfTemplate, TemplateId, UserFile, UserProfile},
    error::ApiError,
};
use thiserror::Error;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "mp3", "wav", "m4a", "ogg", "webm"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiFailure {
    #[error("not logged in")]
    Unauthenticated,
    #[error("{0}")]
    GenerationFailed(String),
    #[error("{0}")]
    RenderFailed(String),
    #[error("network error: {0}")]
    NetworkUnavailable(String),
    #[error("{0}")]
    Rejected(String),
    #[error("unexpected response from server: {0}")]
    InvalidResponse(String),
    #[error("{0}")]
    InvalidInput(String),
}

impl ApiFailure {
    pub fn from_api_error(error: ApiError, otherwise: impl FnOnce(String) -> ApiFailure) -> Self {
        if error.is_unauthorized() {
            ApiFailure::Unauthenticated
        } else {
            otherwise(error.message)
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiFailure::Unauthenticated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptInput {
    File { filename: String, bytes: Vec<u8> },
    Text(String),
}

impl TranscriptInput {
    pub async fn from_path(path: &Path) -> Result<Self, ApiFailure> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ApiFailure::InvalidInput(format!("invalid file path {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            ApiFailure::InvalidInput(format!("failed to read {}: {err}", path.display()))
        })?;
        let input = TranscriptInput::File { filename, bytes };
        input.validate()?;
        Ok(input)
    }

    pub fn validate(&self) -> Result<(), ApiFailure> {
        match self {
            TranscriptInput::Text(text) if text.trim().is_empty() => Err(
                ApiFailure::InvalidInput("Transcript is empty".to_string()),
            ),
            TranscriptInput::Text(_) => Ok(()),
            TranscriptInput::File { filename, bytes } => {
                let extension = Path::new(filename)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(str::to_ascii_lowercase);
                match extension {
                    Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => {}
                    _ => {
                        return Err(ApiFailure::InvalidInput(format!(
                            "Unsupported file type: {filename}"
                        )))
                    }
                }
                if bytes.is_empty() {
                    return Err(ApiFailure::InvalidInput("File is empty".to_string()));
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMinutes {
    pub minutes: MinutesDocument,
    pub transcript_length: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub template: TemplateId,
    pub minutes: MinutesDocument,
    pub filename: ArchiveFilename,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub filename: ArchiveFilename,
}

#[async_trait]
pub trait MinutesApi: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<String, ApiFailure>;
    async fn register(&self, username: &str, password: &str, email: &str)
        -> Result<String, ApiFailure>;
    async fn verify_token(&self) -> Result<String, ApiFailure>;
    async fn reset_password(&self, email: &str) -> Result<String, ApiFailure>;
    async fn logout(&self);
    async fn current_user(&self) -> Result<UserProfile, ApiFailure>;
    async fn update_ai_config(&self, config: &AiConfig) -> Result<(), ApiFailure>;
    async fn generate_minutes(&self, input: &TranscriptInput)
        -> Result<GeneratedMinutes, ApiFailure>;
    async fn list_pdf_templates(&self) -> Result<Vec<PdfTemplate>, ApiFailure>;
    async fn render_pdf(&self, request: &RenderRequest) -> Result<RenderedPdf, ApiFailure>;
    async fn list_user_files(&self) -> Result<Vec<UserFile>, ApiFailure>;
    async fn fetch_file(&self, filename: &ArchiveFilename) -> Result<Vec<u8>, ApiFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_extension_case_insensitively() {
        let input = TranscriptInput::File {
            filename: "standup.M4A".into(),
            bytes: vec![1, 2, 3],
        };
        assert!(input.validate().is_ok());

        let input = TranscriptInput::File {
            filename: "notes.docx".into(),
            bytes: vec![1],
        };
        assert!(matches!(input.validate(), Err(ApiFailure::InvalidInput(_))));
    }

    #[test]
    fn rejects_empty_inputs() {
        assert!(TranscriptInput::Text("  \n".into()).validate().is_err());
        let input = TranscriptInput::File {
            filename: "a.txt".into(),
            bytes: Vec::new(),
        };
        assert_eq!(
            input.validate(),
            Err(ApiFailure::InvalidInput("File is empty".into()))
        );
    }

    #[test]
    fn unauthorized_backend_errors_become_unauthenticated() {
        let failure = ApiFailure::from_api_error(
            ApiError::from_backend_message("Invalid or expired token"),
            ApiFailure::RenderFailed,
        );
        assert!(failure.is_unauthenticated());

        let failure = ApiFailure::from_api_error(
            ApiError::from_backend_message("Failed to generate PDF"),
            ApiFailure::RenderFailed,
        );
        assert_eq!(failure, ApiFailure::RenderFailed("Failed to generate PDF".into()));
    }

    #[tokio::test]
    async fn from_path_reads_and_validates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("meeting.txt");
        std::fs::write(&path, "we met").expect("write");
        let input = TranscriptInput::from_path(&path).await.expect("input");
        assert_eq!(
            input,
            TranscriptInput::File {
                filename: "meeting.txt".into(),
                bytes: b"we met".to_vec(),
            }
        );

        let missing = TranscriptInput::from_path(&dir.path().join("gone.wav")).await;
        assert!(matches!(missing, Err(ApiFailure::InvalidInput(_))));
    }
}

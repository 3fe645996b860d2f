use serde::{Deserialize, Serialize};

use crate::{
    domain::{AiConfig, ArchiveFilename, MinutesDocument, PdfTemplate, UsageStats, UserFile},
    error::ApiError,
};

pub mod form {
    pub const TOKEN: &str = "token";
    pub const FILE: &str = "file";
    pub const TRANSCRIPT_TEXT: &str = "transcript_text";
    pub const TEMPLATE: &str = "template";
    pub const MINUTES: &str = "minutes";
    pub const FILENAME: &str = "filename";
}

pub mod routes {
    pub const LOGIN: &str = "/login";
    pub const CREATE_USER: &str = "/create_user";
    pub const VERIFY_TOKEN: &str = "/verify_token";
    pub const RESET_PASSWORD: &str = "/reset_password";
    pub const GET_USER: &str = "/get_user";
    pub const UPDATE_USER: &str = "/update_user";
    pub const PROCESS_TRANSCRIPT: &str = "/process_transcript";
    pub const PDF_TEMPLATES: &str = "/pdf_templates";
    pub const CREATE_PDF: &str = "/create_pdf";
    pub const GET_USER_FILES: &str = "/get_user_files";
    pub const GET_FILE: &str = "/get_file";
}

/// Reply shape of the account endpoints (`/login`, `/create_user`, `/reset_password`,
/// `/update_user`). On `/login` the message *is* the token when the login succeeded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyTokenResponse {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetUserResponse {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub ai_config: Option<AiConfig>,
    #[serde(default)]
    pub stats: Option<UsageStats>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub ai_config: AiConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessTranscriptResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub minutes: Option<MinutesDocument>,
    #[serde(default)]
    pub transcript_length: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub templates: Vec<PdfTemplate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePdfResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pdf_data: Option<String>,
    #[serde(default)]
    pub filename: Option<ArchiveFilename>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFilesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub files: Vec<UserFile>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileDataResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub filename: Option<ArchiveFilename>,
    #[serde(default)]
    pub message: Option<String>,
}

pub fn failure(message: Option<String>, fallback: &str) -> ApiError {
    let message = message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    ApiError::from_backend_message(message)
}

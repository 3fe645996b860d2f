use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder, StatusCode,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::{AiConfig, ArchiveFilename, PdfTemplate, UserFile, UserProfile},
    protocol::{
        failure, form, routes, CreatePdfResponse, FileDataResponse, GetUserResponse,
        MessageResponse, ProcessTranscriptResponse, TemplatesResponse, UpdateUserRequest,
        UserFilesResponse, VerifyTokenResponse,
    },
};
use tokio::sync::RwLock;
use tracing::{info, warn};
use url::Url;

use crate::api::{
    ApiFailure, GeneratedMinutes, MinutesApi, RenderRequest, RenderedPdf, TranscriptInput,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct HttpMinutesApi {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpMinutesApi {
    pub fn new(base_url: &str) -> Result<Self, ApiFailure> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiFailure> {
        let base_url = normalize_base_url(base_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ApiFailure::InvalidInput(format!("failed to build http client: {err}")))?;
        Ok(Self {
            http,
            base_url,
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    fn url(&self, route: &str) -> String {
        format!("{}{route}", self.base_url)
    }

    async fn require_token(&self) -> Result<String, ApiFailure> {
        self.token
            .read()
            .await
            .clone()
            .ok_or(ApiFailure::Unauthenticated)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiFailure> {
        let response = request.send().await.map_err(transport_failure)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiFailure::Unauthenticated);
        }
        if !status.is_success() {
            return Err(ApiFailure::Rejected(format!("server returned {status}")));
        }
        response.json::<T>().await.map_err(transport_failure)
    }
}

pub fn normalize_base_url(raw: &str) -> Result<String, ApiFailure> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|err| ApiFailure::InvalidInput(format!("invalid api base url '{raw}': {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiFailure::InvalidInput(format!(
            "api base url must be http or https, got '{raw}'"
        )));
    }
    Ok(trimmed.to_string())
}

fn transport_failure(err: reqwest::Error) -> ApiFailure {
    if err.is_decode() {
        ApiFailure::InvalidResponse(err.to_string())
    } else {
        ApiFailure::NetworkUnavailable(err.to_string())
    }
}

fn decode_pdf(data: &str) -> Result<Vec<u8>, ApiFailure> {
    STANDARD
        .decode(data.trim())
        .map_err(|err| ApiFailure::InvalidResponse(format!("pdf payload is not base64: {err}")))
}

#[async_trait]
impl MinutesApi for HttpMinutesApi {
    async fn login(&self, username: &str, password: &str) -> Result<String, ApiFailure> {
        let body: MessageResponse = self
            .send_json(
                self.http
                    .post(self.url(routes::LOGIN))
                    .query(&[("username", username), ("password", password)]),
            )
            .await?;
        match body.message {
            Some(token) if !token.is_empty() && !token.contains("Invalid") => {
                self.set_token(Some(token.clone())).await;
                info!(%username, "logged in");
                Ok(token)
            }
            message => {
                warn!(%username, "login rejected");
                Err(ApiFailure::Rejected(
                    message.unwrap_or_else(|| "Login failed".to_string()),
                ))
            }
        }
    }

    async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<String, ApiFailure> {
        let body: MessageResponse = self
            .send_json(self.http.post(self.url(routes::CREATE_USER)).query(&[
                ("username", username),
                ("password", password),
                ("email", email),
            ]))
            .await?;
        match body.message {
            Some(message) if message.contains("successfully") => Ok(message),
            message => Err(ApiFailure::Rejected(
                message.unwrap_or_else(|| "Registration failed".to_string()),
            )),
        }
    }

    async fn verify_token(&self) -> Result<String, ApiFailure> {
        let token = self.require_token().await?;
        let body: VerifyTokenResponse = self
            .send_json(
                self.http
                    .post(self.url(routes::VERIFY_TOKEN))
                    .query(&[("token", token.as_str())]),
            )
            .await?;
        body.username.ok_or(ApiFailure::Unauthenticated)
    }

    async fn reset_password(&self, email: &str) -> Result<String, ApiFailure> {
        let body: MessageResponse = self
            .send_json(
                self.http
                    .post(self.url(routes::RESET_PASSWORD))
                    .query(&[("email", email)]),
            )
            .await?;
        match body.message {
            Some(message) if message.contains("sent") => Ok(message),
            message => Err(ApiFailure::Rejected(
                message.unwrap_or_else(|| "Password reset failed".to_string()),
            )),
        }
    }

    async fn logout(&self) {
        self.set_token(None).await;
    }

    async fn current_user(&self) -> Result<UserProfile, ApiFailure> {
        let token = self.require_token().await?;
        let body: GetUserResponse = self
            .send_json(
                self.http
                    .post(self.url(routes::GET_USER))
                    .query(&[("token", token.as_str())]),
            )
            .await?;
        match body.username {
            Some(username) => Ok(UserProfile {
                username,
                email: body.email,
                ai_config: body.ai_config.unwrap_or_default(),
                stats: body.stats.unwrap_or_default(),
            }),
            None => Err(ApiFailure::from_api_error(
                failure(body.message, "Failed to get user"),
                ApiFailure::Rejected,
            )),
        }
    }

    async fn update_ai_config(&self, config: &AiConfig) -> Result<(), ApiFailure> {
        if !config.ai_provider.is_enabled() {
            return Err(ApiFailure::InvalidInput(format!(
                "{} is not supported yet",
                config.ai_provider.label()
            )));
        }
        let token = self.require_token().await?;
        let body: MessageResponse = self
            .send_json(
                self.http
                    .post(self.url(routes::UPDATE_USER))
                    .query(&[("token", token.as_str())])
                    .json(&UpdateUserRequest {
                        ai_config: config.clone(),
                    }),
            )
            .await?;
        match body.message {
            Some(message) if message.contains("successfully") => Ok(()),
            message => Err(ApiFailure::from_api_error(
                failure(message, "Update failed"),
                ApiFailure::Rejected,
            )),
        }
    }

    async fn generate_minutes(
        &self,
        input: &TranscriptInput,
    ) -> Result<GeneratedMinutes, ApiFailure> {
        input.validate()?;
        let token = self.require_token().await?;
        let form = match input {
            TranscriptInput::File { filename, bytes } => Form::new()
                .text(form::TOKEN, token)
                .part(form::FILE, Part::bytes(bytes.clone()).file_name(filename.clone())),
            TranscriptInput::Text(text) => Form::new()
                .text(form::TOKEN, token)
                .text(form::TRANSCRIPT_TEXT, text.clone()),
        };
        let body: ProcessTranscriptResponse = self
            .send_json(
                self.http
                    .post(self.url(routes::PROCESS_TRANSCRIPT))
                    .multipart(form),
            )
            .await
            .map_err(|err| match err {
                ApiFailure::Rejected(message) => ApiFailure::GenerationFailed(message),
                other => other,
            })?;
        if !body.success {
            return Err(ApiFailure::from_api_error(
                failure(body.message, "Processing failed"),
                ApiFailure::GenerationFailed,
            ));
        }
        let minutes = body.minutes.ok_or_else(|| {
            ApiFailure::InvalidResponse("generation succeeded without minutes".to_string())
        })?;
        Ok(GeneratedMinutes {
            minutes,
            transcript_length: body.transcript_length,
        })
    }

    async fn list_pdf_templates(&self) -> Result<Vec<PdfTemplate>, ApiFailure> {
        let body: TemplatesResponse = self
            .send_json(self.http.get(self.url(routes::PDF_TEMPLATES)))
            .await?;
        if body.success {
            Ok(body.templates)
        } else {
            Err(ApiFailure::Rejected("Failed to get templates".to_string()))
        }
    }

    async fn render_pdf(&self, request: &RenderRequest) -> Result<RenderedPdf, ApiFailure> {
        let token = self.require_token().await?;
        let minutes = serde_json::to_string(&request.minutes)
            .map_err(|err| ApiFailure::InvalidInput(format!("failed to encode minutes: {err}")))?;
        let form = Form::new()
            .text(form::TOKEN, token)
            .text(form::TEMPLATE, request.template.0.clone())
            .text(form::MINUTES, minutes)
            .text(form::FILENAME, request.filename.0.clone());
        let body: CreatePdfResponse = self
            .send_json(self.http.post(self.url(routes::CREATE_PDF)).multipart(form))
            .await
            .map_err(|err| match err {
                ApiFailure::Rejected(message) => ApiFailure::RenderFailed(message),
                other => other,
            })?;
        if !body.success {
            return Err(ApiFailure::from_api_error(
                failure(body.message, "Failed to create PDF"),
                ApiFailure::RenderFailed,
            ));
        }
        let data = body
            .pdf_data
            .ok_or_else(|| ApiFailure::InvalidResponse("pdf render returned no data".to_string()))?;
        Ok(RenderedPdf {
            bytes: decode_pdf(&data)?,
            filename: body.filename.unwrap_or_else(|| request.filename.clone()),
        })
    }

    async fn list_user_files(&self) -> Result<Vec<UserFile>, ApiFailure> {
        let token = self.require_token().await?;
        let body: UserFilesResponse = self
            .send_json(
                self.http
                    .post(self.url(routes::GET_USER_FILES))
                    .query(&[("token", token.as_str())]),
            )
            .await?;
        if body.success {
            Ok(body.files)
        } else {
            Err(ApiFailure::from_api_error(
                failure(body.message, "Failed to get files"),
                ApiFailure::Rejected,
            ))
        }
    }

    async fn fetch_file(&self, filename: &ArchiveFilename) -> Result<Vec<u8>, ApiFailure> {
        let token = self.require_token().await?;
        let body: FileDataResponse = self
            .send_json(
                self.http
                    .post(self.url(routes::GET_FILE))
                    .query(&[("token", token.as_str()), ("filename", filename.as_str())]),
            )
            .await?;
        if !body.success {
            return Err(ApiFailure::from_api_error(
                failure(body.message, "Failed to get file"),
                ApiFailure::Rejected,
            ));
        }
        let data = body
            .data
            .ok_or_else(|| ApiFailure::InvalidResponse(format!("no data for {filename}")))?;
        decode_pdf(&data)
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use shared::domain::{
    AiConfig, ArchiveFilename, MinutesDocument, PdfTemplate, UsageStats, UserFile, UserProfile,
};
use tokio::sync::Notify;

use crate::api::{
    ApiFailure, GeneratedMinutes, MinutesApi, RenderRequest, RenderedPdf, TranscriptInput,
};

#[derive(Default)]
pub struct FakeMinutesApi {
    pub profile: Mutex<Option<UserProfile>>,
    pub generations: Mutex<VecDeque<Result<GeneratedMinutes, ApiFailure>>>,
    pub render_failures: Mutex<VecDeque<ApiFailure>>,
    pub render_requests: Mutex<Vec<RenderRequest>>,
    pub templates: Mutex<Vec<PdfTemplate>>,
    pub template_calls: AtomicUsize,
    pub files: Mutex<Vec<UserFile>>,
    pub file_bytes: Mutex<HashMap<String, Vec<u8>>>,
    /// When set, generation and rendering wait for a permit before answering.
    pub hold: Mutex<Option<Arc<Notify>>>,
}

impl FakeMinutesApi {
    pub fn signed_in(api_key: &str) -> Self {
        let fake = Self::default();
        *fake.profile.lock().expect("profile") = Some(UserProfile {
            username: "bo".into(),
            email: Some("bo@example.com".into()),
            ai_config: AiConfig {
                api_key: api_key.into(),
                ..AiConfig::default()
            },
            stats: UsageStats::default(),
        });
        fake
    }

    pub fn queue_generation(&self, result: Result<GeneratedMinutes, ApiFailure>) {
        self.generations.lock().expect("generations").push_back(result);
    }

    pub fn hold_responses(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock().expect("hold") = Some(notify.clone());
        notify
    }

    async fn wait_if_held(&self) {
        let hold = self.hold.lock().expect("hold").clone();
        if let Some(notify) = hold {
            notify.notified().await;
        }
    }
}

pub fn minutes(title: &str) -> MinutesDocument {
    MinutesDocument {
        title: Some(title.into()),
        attendees: vec!["Bo".into()],
        decisions: vec!["Ship it".into()],
        ..MinutesDocument::default()
    }
}

pub fn generated(title: &str) -> GeneratedMinutes {
    GeneratedMinutes {
        minutes: minutes(title),
        transcript_length: Some(42),
    }
}

pub fn template(id: &str) -> PdfTemplate {
    PdfTemplate {
        id: id.into(),
        name: id.into(),
        description: String::new(),
        primary_color: None,
        accent_color: None,
    }
}

pub fn user_file(filename: &str, created_at: Option<&str>) -> UserFile {
    UserFile {
        filename: filename.into(),
        title: Some("Standup".into()),
        template: Some("modern".into()),
        created_at: created_at.map(str::to_string),
    }
}

#[async_trait]
impl MinutesApi for FakeMinutesApi {
    async fn login(&self, _username: &str, _password: &str) -> Result<String, ApiFailure> {
        Ok("tok".into())
    }

    async fn register(
        &self,
        username: &str,
        _password: &str,
        _email: &str,
    ) -> Result<String, ApiFailure> {
        Ok(format!("User {username} registered successfully."))
    }

    async fn verify_token(&self) -> Result<String, ApiFailure> {
        self.current_user().await.map(|profile| profile.username)
    }

    async fn reset_password(&self, _email: &str) -> Result<String, ApiFailure> {
        Ok("Password reset email sent".into())
    }

    async fn logout(&self) {
        *self.profile.lock().expect("profile") = None;
    }

    async fn current_user(&self) -> Result<UserProfile, ApiFailure> {
        self.profile
            .lock()
            .expect("profile")
            .clone()
            .ok_or(ApiFailure::Unauthenticated)
    }

    async fn update_ai_config(&self, config: &AiConfig) -> Result<(), ApiFailure> {
        let mut profile = self.profile.lock().expect("profile");
        let profile = profile.as_mut().ok_or(ApiFailure::Unauthenticated)?;
        profile.ai_config = config.clone();
        Ok(())
    }

    async fn generate_minutes(
        &self,
        _input: &TranscriptInput,
    ) -> Result<GeneratedMinutes, ApiFailure> {
        self.wait_if_held().await;
        self.generations
            .lock()
            .expect("generations")
            .pop_front()
            .unwrap_or_else(|| Err(ApiFailure::GenerationFailed("no response queued".into())))
    }

    async fn list_pdf_templates(&self) -> Result<Vec<PdfTemplate>, ApiFailure> {
        self.template_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.templates.lock().expect("templates").clone())
    }

    async fn render_pdf(&self, request: &RenderRequest) -> Result<RenderedPdf, ApiFailure> {
        self.render_requests
            .lock()
            .expect("requests")
            .push(request.clone());
        self.wait_if_held().await;
        if let Some(failure) = self.render_failures.lock().expect("failures").pop_front() {
            return Err(failure);
        }
        Ok(RenderedPdf {
            bytes: b"%PDF-1.4".to_vec(),
            filename: request.filename.clone(),
        })
    }

    async fn list_user_files(&self) -> Result<Vec<UserFile>, ApiFailure> {
        Ok(self.files.lock().expect("files").clone())
    }

    async fn fetch_file(&self, filename: &ArchiveFilename) -> Result<Vec<u8>, ApiFailure> {
        self.file_bytes
            .lock()
            .expect("bytes")
            .get(filename.as_str())
            .cloned()
            .ok_or_else(|| ApiFailure::Rejected(format!("File not found: {filename}")))
    }
}

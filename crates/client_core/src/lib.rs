use std::sync::Arc;

use chrono::Utc;
use shared::domain::{ArchiveFilename, MinutesDocument, PdfTemplate, TemplateId, UserProfile};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod api;
pub mod archive;
pub mod draft;
pub mod edit;
pub mod export;
pub mod http;
pub mod session;
pub mod workspace;

pub use api::{
    ApiFailure, GeneratedMinutes, MinutesApi, RenderRequest, RenderedPdf, TranscriptInput,
};
pub use archive::{ArchiveError, FileArchive};
pub use edit::{EditError, MinutesEdit};
pub use export::{ExportError, ExportStage};
pub use http::HttpMinutesApi;
pub use session::TokenStore;
pub use workspace::{GenerationGate, WorkspaceController, WorkspaceError};

#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceEvent {
    ProfileUpdated {
        username: String,
        has_ai_credential: bool,
    },
    SignedOut,
    MinutesReplaced(MinutesDocument),
    GenerationFailed(String),
    DraftUpdated {
        revision: u64,
    },
    MinutesCommitted(MinutesDocument),
    ExportStageChanged(ExportStage),
    PdfReady(ArchiveFilename),
    ExportFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Ready(RenderedPdf),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceSnapshot {
    pub committed: Option<MinutesDocument>,
    pub draft: Option<MinutesDocument>,
    pub draft_revision: Option<u64>,
    pub export_stage: ExportStage,
    pub selected_template: Option<TemplateId>,
    pub pdf_filename: Option<ArchiveFilename>,
    pub pdf_error: Option<String>,
    pub generation_in_flight: bool,
    pub generation_error: Option<String>,
    pub transcript_length: Option<u64>,
}

struct WorkspaceState {
    controller: WorkspaceController,
    profile: Option<UserProfile>,
}

/// Async front of [`WorkspaceController`]: backend calls run without holding the state lock
/// and their results are applied through the controller's tickets.
pub struct MinutesWorkspace {
    api: Arc<dyn MinutesApi>,
    inner: Mutex<WorkspaceState>,
    events: broadcast::Sender<WorkspaceEvent>,
}

impl MinutesWorkspace {
    pub fn new(api: Arc<dyn MinutesApi>, default_template: TemplateId) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            inner: Mutex::new(WorkspaceState {
                controller: WorkspaceController::new(default_template),
                profile: None,
            }),
            events,
        })
    }

    pub fn api(&self) -> &Arc<dyn MinutesApi> {
        &self.api
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.events.subscribe()
    }

    pub async fn profile(&self) -> Option<UserProfile> {
        self.inner.lock().await.profile.clone()
    }

    pub async fn refresh_profile(&self) -> Result<UserProfile, WorkspaceError> {
        match self.api.current_user().await {
            Ok(profile) => {
                self.inner.lock().await.profile = Some(profile.clone());
                let _ = self.events.send(WorkspaceEvent::ProfileUpdated {
                    username: profile.username.clone(),
                    has_ai_credential: profile.has_ai_credential(),
                });
                Ok(profile)
            }
            Err(failure) => {
                if failure.is_unauthenticated() {
                    self.forget_profile().await;
                }
                Err(failure.into())
            }
        }
    }

    pub async fn generation_gate(&self) -> GenerationGate {
        match self.inner.lock().await.profile.as_ref() {
            None => GenerationGate::SignedOut,
            Some(profile) if !profile.has_ai_credential() => GenerationGate::MissingAiCredential,
            Some(_) => GenerationGate::Ready,
        }
    }

    pub async fn generate(&self, input: TranscriptInput) -> Result<MinutesDocument, WorkspaceError> {
        let gate = self.generation_gate().await;
        if gate != GenerationGate::Ready {
            return Err(WorkspaceError::NotReady(gate));
        }
        input.validate()?;
        let ticket = self.inner.lock().await.controller.begin_generation()?;

        let result = self.api.generate_minutes(&input).await;
        let unauthenticated = matches!(&result, Err(failure) if failure.is_unauthenticated());

        let outcome = {
            let mut state = self.inner.lock().await;
            state
                .controller
                .finish_generation(ticket, result)
                .cloned()
        };
        match &outcome {
            Ok(doc) => {
                let _ = self.events.send(WorkspaceEvent::MinutesReplaced(doc.clone()));
            }
            Err(WorkspaceError::StaleResponse) => {}
            Err(err) => {
                let _ = self
                    .events
                    .send(WorkspaceEvent::GenerationFailed(err.to_string()));
            }
        }
        if unauthenticated {
            self.forget_profile().await;
        }
        outcome
    }

    pub async fn load_templates(&self) -> Result<Vec<PdfTemplate>, WorkspaceError> {
        if let Some(templates) = self.inner.lock().await.controller.templates() {
            return Ok(templates.to_vec());
        }
        let templates = self.api.list_pdf_templates().await?;
        info!(count = templates.len(), "pdf templates loaded");
        self.inner
            .lock()
            .await
            .controller
            .set_templates(templates.clone());
        Ok(templates)
    }

    pub async fn open_template_picker(&self) -> Result<TemplateId, WorkspaceError> {
        if let Err(err) = self.load_templates().await {
            warn!(error = %err, "template list unavailable; using configured default");
        }
        let selected = self.inner.lock().await.controller.open_template_picker()?;
        self.emit_stage(ExportStage::TemplateSelect);
        Ok(selected)
    }

    pub async fn select_template(&self, template: TemplateId) -> Result<(), WorkspaceError> {
        self.inner.lock().await.controller.select_template(template)
    }

    pub async fn confirm_export(&self) -> Result<ExportOutcome, WorkspaceError> {
        let ticket = self.inner.lock().await.controller.begin_export(Utc::now())?;

        let result = self.api.render_pdf(&ticket.request).await;

        let mut state = self.inner.lock().await;
        let stage = state.controller.finish_export(ticket, result)?;
        let export = state.controller.export();
        let outcome = match (stage, export.pdf()) {
            (ExportStage::PdfReady, Some(pdf)) => {
                let _ = self.events.send(WorkspaceEvent::PdfReady(pdf.filename.clone()));
                ExportOutcome::Ready(pdf.clone())
            }
            _ => {
                let message = export
                    .pdf_error()
                    .unwrap_or("Failed to create PDF")
                    .to_string();
                let _ = self.events.send(WorkspaceEvent::ExportFailed(message.clone()));
                ExportOutcome::Failed(message)
            }
        };
        drop(state);
        self.emit_stage(stage);
        Ok(outcome)
    }

    pub async fn cancel_export(&self) -> Result<(), WorkspaceError> {
        self.inner.lock().await.controller.cancel_export()?;
        self.emit_stage(ExportStage::None);
        Ok(())
    }

    pub async fn back_to_templates(&self) -> Result<(), WorkspaceError> {
        self.inner.lock().await.controller.back_to_templates()?;
        self.emit_stage(ExportStage::TemplateSelect);
        Ok(())
    }

    pub async fn back_to_result(&self) -> Result<(), WorkspaceError> {
        self.inner.lock().await.controller.back_to_result()?;
        self.emit_stage(ExportStage::None);
        Ok(())
    }

    pub async fn start_edit(&self) -> Result<MinutesDocument, WorkspaceError> {
        let mut state = self.inner.lock().await;
        let draft = state.controller.start_edit()?.clone();
        self.emit_draft(&state.controller);
        Ok(draft)
    }

    pub async fn apply_edit(&self, edit: &MinutesEdit) -> Result<MinutesDocument, WorkspaceError> {
        let mut state = self.inner.lock().await;
        let draft = state.controller.apply_edit(edit)?.clone();
        self.emit_draft(&state.controller);
        Ok(draft)
    }

    pub async fn commit_edit(&self) -> Result<MinutesDocument, WorkspaceError> {
        let committed = self.inner.lock().await.controller.commit_edit()?.clone();
        info!("minutes edits saved");
        let _ = self
            .events
            .send(WorkspaceEvent::MinutesCommitted(committed.clone()));
        Ok(committed)
    }

    pub async fn discard_edit(&self) -> Result<(), WorkspaceError> {
        self.inner.lock().await.controller.discard_edit()
    }

    pub async fn start_over(&self) {
        self.inner.lock().await.controller.start_over();
        self.emit_stage(ExportStage::None);
    }

    pub async fn logout(&self) {
        self.api.logout().await;
        self.inner.lock().await.controller.start_over();
        self.forget_profile().await;
    }

    pub async fn snapshot(&self) -> WorkspaceSnapshot {
        let state = self.inner.lock().await;
        let controller = &state.controller;
        let export = controller.export();
        WorkspaceSnapshot {
            committed: controller.committed().cloned(),
            draft: controller.draft().cloned(),
            draft_revision: controller.draft_revision(),
            export_stage: export.stage(),
            selected_template: export.selected_template().cloned(),
            pdf_filename: export.pdf().map(|pdf| pdf.filename.clone()),
            pdf_error: export.pdf_error().map(str::to_string),
            generation_in_flight: controller.generation_in_flight(),
            generation_error: controller.generation_error().map(str::to_string),
            transcript_length: controller.transcript_length(),
        }
    }

    async fn forget_profile(&self) {
        self.inner.lock().await.profile = None;
        let _ = self.events.send(WorkspaceEvent::SignedOut);
    }

    fn emit_stage(&self, stage: ExportStage) {
        let _ = self.events.send(WorkspaceEvent::ExportStageChanged(stage));
    }

    fn emit_draft(&self, controller: &WorkspaceController) {
        if let Some(revision) = controller.draft_revision() {
            let _ = self.events.send(WorkspaceEvent::DraftUpdated { revision });
        }
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

use chrono::{DateTime, Utc};
use shared::domain::{MinutesDocument, PdfTemplate, TemplateId};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    api::{ApiFailure, GeneratedMinutes, RenderedPdf},
    draft::MinutesDraftStore,
    edit::{EditError, MinutesEdit},
    export::{ExportError, ExportFilenames, ExportFlow, ExportStage, RenderTicket},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationGate {
    Ready,
    SignedOut,
    MissingAiCredential,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Api(#[from] ApiFailure),
    #[error("no generated minutes yet")]
    NoDocument,
    #[error("save or discard the current edits first")]
    EditSessionActive,
    #[error("close the export dialog before editing")]
    ExportActive,
    #[error("a generation request is already in progress")]
    RequestInFlight,
    #[error("response arrived after the workspace was reset; ignored")]
    StaleResponse,
    #[error("generation unavailable: {0:?}")]
    NotReady(GenerationGate),
    #[error("unknown template {0}")]
    UnknownTemplate(TemplateId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    epoch: u64,
}

#[derive(Debug, Clone, Default)]
struct GenerationState {
    in_flight: bool,
    last_error: Option<String>,
    transcript_length: Option<u64>,
    epoch: u64,
}

/// The single per-tab controller: owns the minutes, their draft and the export flow.
///
/// Editing and exporting are mutually exclusive: an edit session cannot start while
/// the export flow is open and the picker cannot open while a draft exists.
#[derive(Debug, Clone)]
pub struct WorkspaceController {
    drafts: MinutesDraftStore,
    export: ExportFlow,
    filenames: ExportFilenames,
    templates: Option<Vec<PdfTemplate>>,
    default_template: TemplateId,
    generation: GenerationState,
}

impl WorkspaceController {
    pub fn new(default_template: TemplateId) -> Self {
        Self {
            drafts: MinutesDraftStore::new(),
            export: ExportFlow::new(),
            filenames: ExportFilenames::default(),
            templates: None,
            default_template,
            generation: GenerationState::default(),
        }
    }

    pub fn committed(&self) -> Option<&MinutesDocument> {
        self.drafts.committed()
    }

    pub fn draft(&self) -> Option<&MinutesDocument> {
        self.drafts.draft()
    }

    pub fn draft_revision(&self) -> Option<u64> {
        self.drafts.draft_revision()
    }

    pub fn is_editing(&self) -> bool {
        self.drafts.is_editing()
    }

    pub fn export(&self) -> &ExportFlow {
        &self.export
    }

    pub fn export_stage(&self) -> ExportStage {
        self.export.stage()
    }

    pub fn templates(&self) -> Option<&[PdfTemplate]> {
        self.templates.as_deref()
    }

    pub fn set_templates(&mut self, templates: Vec<PdfTemplate>) {
        self.templates = Some(templates);
    }

    pub fn generation_in_flight(&self) -> bool {
        self.generation.in_flight
    }

    pub fn generation_error(&self) -> Option<&str> {
        self.generation.last_error.as_deref()
    }

    pub fn transcript_length(&self) -> Option<u64> {
        self.generation.transcript_length
    }

    pub fn replace_with_new_document(&mut self, doc: MinutesDocument) {
        self.drafts.replace_with_new_document(doc);
        self.export.reset();
        self.generation.last_error = None;
    }

    pub fn start_over(&mut self) {
        self.drafts.clear();
        self.export.reset();
        self.generation = GenerationState {
            epoch: self.generation.epoch + 1,
            ..GenerationState::default()
        };
    }

    pub fn begin_generation(&mut self) -> Result<GenerationTicket, WorkspaceError> {
        if self.generation.in_flight {
            return Err(WorkspaceError::RequestInFlight);
        }
        self.generation.in_flight = true;
        self.generation.last_error = None;
        Ok(GenerationTicket {
            epoch: self.generation.epoch,
        })
    }

    pub fn finish_generation(
        &mut self,
        ticket: GenerationTicket,
        result: Result<GeneratedMinutes, ApiFailure>,
    ) -> Result<&MinutesDocument, WorkspaceError> {
        if ticket.epoch != self.generation.epoch {
            warn!("discarding generation result for a reset workspace");
            return Err(WorkspaceError::StaleResponse);
        }
        self.generation.in_flight = false;
        match result {
            Ok(generated) => {
                info!(
                    transcript_length = generated.transcript_length,
                    "minutes generated"
                );
                self.replace_with_new_document(generated.minutes);
                self.generation.transcript_length = generated.transcript_length;
                self.drafts.committed().ok_or(WorkspaceError::NoDocument)
            }
            Err(failure) => {
                warn!(error = %failure, "minutes generation failed");
                self.generation.last_error = Some(failure.to_string());
                Err(failure.into())
            }
        }
    }

    pub fn start_edit(&mut self) -> Result<&MinutesDocument, WorkspaceError> {
        if self.export.stage() != ExportStage::None {
            return Err(WorkspaceError::ExportActive);
        }
        Ok(self.drafts.start_edit()?)
    }

    pub fn apply_edit(&mut self, edit: &MinutesEdit) -> Result<&MinutesDocument, WorkspaceError> {
        Ok(self.drafts.apply(edit)?)
    }

    pub fn commit_edit(&mut self) -> Result<&MinutesDocument, WorkspaceError> {
        Ok(self.drafts.commit()?)
    }

    pub fn discard_edit(&mut self) -> Result<(), WorkspaceError> {
        Ok(self.drafts.discard()?)
    }

    /// Template preselected when the picker opens: the configured default if the
    /// backend offers it, otherwise the first offered template.
    pub fn default_template(&self) -> TemplateId {
        match self.templates.as_deref() {
            Some(templates) if !templates.is_empty() => templates
                .iter()
                .find(|template| template.id == self.default_template)
                .unwrap_or(&templates[0])
                .id
                .clone(),
            _ => self.default_template.clone(),
        }
    }

    pub fn open_template_picker(&mut self) -> Result<TemplateId, WorkspaceError> {
        if self.drafts.committed().is_none() {
            return Err(WorkspaceError::NoDocument);
        }
        if self.drafts.is_editing() {
            return Err(WorkspaceError::EditSessionActive);
        }
        let default_template = self.default_template();
        self.export.open_template_picker(default_template.clone())?;
        Ok(default_template)
    }

    /// An empty backend list falls back to the configured default, so it restricts nothing.
    pub fn select_template(&mut self, template: TemplateId) -> Result<(), WorkspaceError> {
        if let Some(templates) = self.templates.as_deref().filter(|t| !t.is_empty()) {
            if !templates.iter().any(|known| known.id == template) {
                return Err(WorkspaceError::UnknownTemplate(template));
            }
        }
        Ok(self.export.select_template(template)?)
    }

    pub fn begin_export(&mut self, now: DateTime<Utc>) -> Result<RenderTicket, WorkspaceError> {
        let committed = self.drafts.committed().ok_or(WorkspaceError::NoDocument)?;
        self.export.confirmable_template()?;
        let filename = self.filenames.next(now);
        Ok(self.export.begin_confirm(committed, filename)?)
    }

    pub fn finish_export(
        &mut self,
        ticket: RenderTicket,
        result: Result<RenderedPdf, ApiFailure>,
    ) -> Result<ExportStage, WorkspaceError> {
        let filename = ticket.request.filename.clone();
        match self.export.finish_confirm(ticket, result) {
            Ok(ExportStage::PdfReady) => {
                info!(%filename, "pdf rendered");
                Ok(ExportStage::PdfReady)
            }
            Ok(stage) => {
                warn!(%filename, error = ?self.export.pdf_error(), "pdf render failed");
                Ok(stage)
            }
            Err(ExportError::StaleRender) => {
                warn!(%filename, "discarding pdf render for a closed export");
                Err(WorkspaceError::StaleResponse)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn cancel_export(&mut self) -> Result<(), WorkspaceError> {
        Ok(self.export.cancel()?)
    }

    pub fn back_to_templates(&mut self) -> Result<(), WorkspaceError> {
        Ok(self.export.back_to_templates()?)
    }

    pub fn back_to_result(&mut self) -> Result<(), WorkspaceError> {
        Ok(self.export.back_to_result()?)
    }
}

#[cfg(test)]
#[path = "tests/workspace_tests.rs"]
mod tests;

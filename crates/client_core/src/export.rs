use std::fmt;

use chrono::{DateTime, Utc};
use shared::domain::{ArchiveFilename, MinutesDocument, TemplateId};
use thiserror::Error;
use tracing::debug;

use crate::api::{ApiFailure, RenderRequest, RenderedPdf};

const EXPORT_FILENAME_PREFIX: &str = "meeting_minutes_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportStage {
    #[default]
    None,
    TemplateSelect,
    PdfReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportEvent {
    OpenTemplatePicker,
    SelectTemplate,
    Confirm,
    Cancel,
    BackToTemplates,
    BackToResult,
}

impl fmt::Display for ExportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportEvent::OpenTemplatePicker => "open the template picker",
            ExportEvent::SelectTemplate => "select a template",
            ExportEvent::Confirm => "confirm the export",
            ExportEvent::Cancel => "cancel the export",
            ExportEvent::BackToTemplates => "go back to templates",
            ExportEvent::BackToResult => "go back to the result",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("cannot {event} from the {stage:?} stage")]
    InvalidTransition { stage: ExportStage, event: ExportEvent },
    #[error("a PDF render is already in progress")]
    RenderInFlight,
    #[error("PDF render finished after the export was closed; result ignored")]
    StaleRender,
}

/// Handed out by [`ExportFlow::begin_confirm`] and redeemed by
/// [`ExportFlow::finish_confirm`]. A ticket from before a cancel or reset no longer matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTicket {
    epoch: u64,
    pub request: RenderRequest,
}

#[derive(Debug, Clone, Default)]
pub struct ExportFlow {
    stage: ExportStage,
    selected_template: Option<TemplateId>,
    pdf: Option<RenderedPdf>,
    pdf_error: Option<String>,
    rendering: bool,
    epoch: u64,
}

impl ExportFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> ExportStage {
        self.stage
    }

    pub fn selected_template(&self) -> Option<&TemplateId> {
        self.selected_template.as_ref()
    }

    pub fn pdf(&self) -> Option<&RenderedPdf> {
        match self.stage {
            ExportStage::PdfReady => self.pdf.as_ref(),
            _ => None,
        }
    }

    pub fn has_retained_pdf(&self) -> bool {
        self.pdf.is_some()
    }

    pub fn pdf_error(&self) -> Option<&str> {
        self.pdf_error.as_deref()
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    pub fn open_template_picker(&mut self, default_template: TemplateId) -> Result<(), ExportError> {
        self.expect_stage(ExportStage::None, ExportEvent::OpenTemplatePicker)?;
        self.pdf = None;
        self.pdf_error = None;
        self.selected_template = Some(default_template);
        self.transition(ExportStage::TemplateSelect);
        Ok(())
    }

    pub fn select_template(&mut self, template: TemplateId) -> Result<(), ExportError> {
        self.expect_stage(ExportStage::TemplateSelect, ExportEvent::SelectTemplate)?;
        if self.rendering {
            return Err(ExportError::RenderInFlight);
        }
        self.selected_template = Some(template);
        self.pdf_error = None;
        Ok(())
    }

    pub fn confirmable_template(&self) -> Result<&TemplateId, ExportError> {
        self.expect_stage(ExportStage::TemplateSelect, ExportEvent::Confirm)?;
        if self.rendering {
            return Err(ExportError::RenderInFlight);
        }
        self.selected_template
            .as_ref()
            .ok_or(ExportError::InvalidTransition {
                stage: self.stage,
                event: ExportEvent::Confirm,
            })
    }

    pub fn begin_confirm(
        &mut self,
        minutes: &MinutesDocument,
        filename: ArchiveFilename,
    ) -> Result<RenderTicket, ExportError> {
        let template = self.confirmable_template()?.clone();
        self.rendering = true;
        self.pdf = None;
        self.pdf_error = None;
        Ok(RenderTicket {
            epoch: self.epoch,
            request: RenderRequest {
                template,
                minutes: minutes.clone(),
                filename,
            },
        })
    }

    pub fn finish_confirm(
        &mut self,
        ticket: RenderTicket,
        result: Result<RenderedPdf, ApiFailure>,
    ) -> Result<ExportStage, ExportError> {
        if ticket.epoch != self.epoch || !self.rendering {
            return Err(ExportError::StaleRender);
        }
        self.rendering = false;
        match result {
            Ok(pdf) => {
                self.pdf = Some(pdf);
                self.pdf_error = None;
                self.transition(ExportStage::PdfReady);
            }
            Err(failure) => {
                self.pdf_error = Some(failure.to_string());
            }
        }
        Ok(self.stage)
    }

    pub fn cancel(&mut self) -> Result<(), ExportError> {
        self.expect_stage(ExportStage::TemplateSelect, ExportEvent::Cancel)?;
        self.reset();
        Ok(())
    }

    pub fn back_to_templates(&mut self) -> Result<(), ExportError> {
        self.expect_stage(ExportStage::PdfReady, ExportEvent::BackToTemplates)?;
        self.transition(ExportStage::TemplateSelect);
        Ok(())
    }

    pub fn back_to_result(&mut self) -> Result<(), ExportError> {
        self.expect_stage(ExportStage::PdfReady, ExportEvent::BackToResult)?;
        self.reset();
        Ok(())
    }

    pub fn reset(&mut self) {
        self.selected_template = None;
        self.pdf = None;
        self.pdf_error = None;
        self.rendering = false;
        self.epoch += 1;
        self.transition(ExportStage::None);
    }

    fn expect_stage(&self, stage: ExportStage, event: ExportEvent) -> Result<(), ExportError> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(ExportError::InvalidTransition {
                stage: self.stage,
                event,
            })
        }
    }

    fn transition(&mut self, next: ExportStage) {
        if self.stage != next {
            debug!(from = ?self.stage, to = ?next, "export stage changed");
        }
        self.stage = next;
    }
}

/// Produces `meeting_minutes_<millis>.pdf`, never repeating a token within one session.
#[derive(Debug, Clone, Default)]
pub struct ExportFilenames {
    last_millis: Option<i64>,
}

impl ExportFilenames {
    pub fn next(&mut self, now: DateTime<Utc>) -> ArchiveFilename {
        let mut millis = now.timestamp_millis();
        if let Some(last) = self.last_millis {
            if millis <= last {
                millis = last + 1;
            }
        }
        self.last_millis = Some(millis);
        ArchiveFilename(format!("{EXPORT_FILENAME_PREFIX}{millis}.pdf"))
    }
}

#[cfg(test)]
#[path = "tests/export_tests.rs"]
mod tests;

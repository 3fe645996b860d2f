use super::*;
use crate::edit::{ActionItemKey, ListField, ScalarField, StructField};
use shared::domain::{ActionItem, ArchiveFilename};

fn minutes(title: &str) -> MinutesDocument {
    MinutesDocument {
        title: Some(title.into()),
        action_items: vec![ActionItem {
            task: "Send notes".into(),
            owner: "Bo".into(),
            due_date: None,
        }],
        ..MinutesDocument::default()
    }
}

fn template(id: &str) -> PdfTemplate {
    PdfTemplate {
        id: id.into(),
        name: id.to_uppercase(),
        description: String::new(),
        primary_color: None,
        accent_color: None,
    }
}

fn generated(title: &str) -> GeneratedMinutes {
    GeneratedMinutes {
        minutes: minutes(title),
        transcript_length: Some(120),
    }
}

fn ready_workspace() -> WorkspaceController {
    let mut workspace = WorkspaceController::new("professional".into());
    workspace.replace_with_new_document(minutes("Standup"));
    workspace
}

fn rendered(name: &str) -> RenderedPdf {
    RenderedPdf {
        bytes: b"%PDF".to_vec(),
        filename: ArchiveFilename::from(name),
    }
}

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_700_000_000_000).expect("timestamp")
}

#[test]
fn generation_success_installs_document_and_clears_error() {
    let mut workspace = WorkspaceController::new("professional".into());
    let ticket = workspace.begin_generation().expect("begin");
    let failed = workspace.finish_generation(
        ticket,
        Err(ApiFailure::GenerationFailed("Transcript is empty".into())),
    );
    assert!(matches!(
        failed,
        Err(WorkspaceError::Api(ApiFailure::GenerationFailed(_)))
    ));
    assert_eq!(workspace.generation_error(), Some("Transcript is empty"));
    assert!(workspace.committed().is_none());

    let ticket = workspace.begin_generation().expect("retry");
    let doc = workspace
        .finish_generation(ticket, Ok(generated("Standup")))
        .expect("generated")
        .clone();
    assert_eq!(doc, minutes("Standup"));
    assert_eq!(workspace.generation_error(), None);
    assert_eq!(workspace.transcript_length(), Some(120));
    assert!(!workspace.generation_in_flight());
}

#[test]
fn failed_generation_keeps_previous_document() {
    let mut workspace = ready_workspace();
    let ticket = workspace.begin_generation().expect("begin");
    let _ = workspace.finish_generation(
        ticket,
        Err(ApiFailure::NetworkUnavailable("connection refused".into())),
    );
    assert_eq!(workspace.committed(), Some(&minutes("Standup")));
}

#[test]
fn only_one_generation_in_flight() {
    let mut workspace = WorkspaceController::new("professional".into());
    let _ticket = workspace.begin_generation().expect("begin");
    assert_eq!(
        workspace.begin_generation(),
        Err(WorkspaceError::RequestInFlight)
    );
}

#[test]
fn generation_landing_after_start_over_is_ignored() {
    let mut workspace = WorkspaceController::new("professional".into());
    let ticket = workspace.begin_generation().expect("begin");
    workspace.start_over();
    assert_eq!(
        workspace.finish_generation(ticket, Ok(generated("Late"))),
        Err(WorkspaceError::StaleResponse)
    );
    assert!(workspace.committed().is_none());
    assert!(!workspace.generation_in_flight());
}

#[test]
fn new_document_resets_edit_and_export_state() {
    let mut workspace = ready_workspace();
    workspace.open_template_picker().expect("picker");
    workspace.replace_with_new_document(minutes("Retro"));
    assert_eq!(workspace.export_stage(), ExportStage::None);

    workspace.start_edit().expect("edit");
    workspace.replace_with_new_document(minutes("Planning"));
    assert!(!workspace.is_editing());
    assert_eq!(workspace.committed(), Some(&minutes("Planning")));
}

#[test]
fn editing_and_exporting_are_mutually_exclusive() {
    let mut workspace = ready_workspace();
    workspace.start_edit().expect("edit");
    assert_eq!(
        workspace.open_template_picker(),
        Err(WorkspaceError::EditSessionActive)
    );
    workspace.discard_edit().expect("discard");

    workspace.open_template_picker().expect("picker");
    assert_eq!(workspace.start_edit().err(), Some(WorkspaceError::ExportActive));
}

#[test]
fn picker_requires_a_document() {
    let mut workspace = WorkspaceController::new("professional".into());
    assert_eq!(
        workspace.open_template_picker(),
        Err(WorkspaceError::NoDocument)
    );
}

#[test]
fn default_template_prefers_configured_then_first_listed() {
    let mut workspace = ready_workspace();
    assert_eq!(workspace.default_template().as_str(), "professional");

    workspace.set_templates(vec![template("minimal"), template("professional")]);
    assert_eq!(workspace.default_template().as_str(), "professional");

    workspace.set_templates(vec![template("modern"), template("minimal")]);
    assert_eq!(
        workspace.open_template_picker().expect("picker").as_str(),
        "modern"
    );
}

#[test]
fn export_renders_committed_document_not_the_draft() {
    let mut workspace = ready_workspace();
    workspace.start_edit().expect("edit");
    workspace
        .apply_edit(&MinutesEdit::UpdateStructItem {
            field: StructField::ActionItem(ActionItemKey::Owner),
            index: 0,
            value: "Alice".into(),
        })
        .expect("owner");
    workspace.commit_edit().expect("commit");

    workspace.open_template_picker().expect("picker");
    let ticket = workspace.begin_export(now()).expect("begin");
    assert_eq!(ticket.request.minutes.action_items[0].owner, "Alice");
    assert_eq!(
        ticket.request.filename.as_str(),
        "meeting_minutes_1700000000000.pdf"
    );

    let stage = workspace
        .finish_export(ticket, Ok(rendered("meeting_minutes_1700000000000.pdf")))
        .expect("finish");
    assert_eq!(stage, ExportStage::PdfReady);
    assert!(workspace.export().pdf().is_some());
}

#[test]
fn successive_exports_get_distinct_filenames() {
    let mut workspace = ready_workspace();
    workspace.open_template_picker().expect("picker");
    let first = workspace.begin_export(now()).expect("first");
    let first_name = first.request.filename.clone();
    workspace
        .finish_export(first, Err(ApiFailure::RenderFailed("boom".into())))
        .expect("failure is not an error");
    assert_eq!(workspace.export_stage(), ExportStage::TemplateSelect);
    assert_eq!(workspace.export().pdf_error(), Some("boom"));

    let second = workspace.begin_export(now()).expect("retry");
    assert_ne!(second.request.filename, first_name);
}

#[test]
fn render_landing_after_new_document_is_ignored() {
    let mut workspace = ready_workspace();
    workspace.open_template_picker().expect("picker");
    let ticket = workspace.begin_export(now()).expect("begin");
    workspace.replace_with_new_document(minutes("Retro"));
    assert_eq!(
        workspace.finish_export(ticket, Ok(rendered("late.pdf"))),
        Err(WorkspaceError::StaleResponse)
    );
    assert_eq!(workspace.export_stage(), ExportStage::None);
}

#[test]
fn edit_errors_surface_through_the_workspace() {
    let mut workspace = ready_workspace();
    assert_eq!(
        workspace
            .apply_edit(&MinutesEdit::set(ScalarField::Title, "x"))
            .err(),
        Some(WorkspaceError::Edit(EditError::NoActiveSession))
    );
    workspace.start_edit().expect("edit");
    assert!(matches!(
        workspace.apply_edit(&MinutesEdit::RemoveItem {
            field: ListField::Decisions,
            index: 0,
        }),
        Err(WorkspaceError::Edit(EditError::IndexOutOfRange { .. }))
    ));
}

#[test]
fn selection_is_limited_to_listed_templates() {
    let mut workspace = ready_workspace();
    workspace.set_templates(vec![template("professional"), template("minimal")]);
    workspace.open_template_picker().expect("picker");
    assert_eq!(
        workspace.select_template("neon".into()),
        Err(WorkspaceError::UnknownTemplate("neon".into()))
    );
    workspace.select_template("minimal".into()).expect("listed");
    let ticket = workspace.begin_export(now()).expect("begin");
    assert_eq!(ticket.request.template.as_str(), "minimal");
}

#[test]
fn empty_template_list_keeps_configured_default_selectable() {
    let mut workspace = ready_workspace();
    workspace.set_templates(Vec::new());
    let preselected = workspace.open_template_picker().expect("picker");
    assert_eq!(preselected.as_str(), "professional");
    workspace
        .select_template(preselected)
        .expect("configured default");
    let ticket = workspace.begin_export(now()).expect("begin");
    assert_eq!(ticket.request.template.as_str(), "professional");
}

#[test]
fn rejected_confirm_does_not_advance_filenames() {
    let mut workspace = ready_workspace();
    assert!(matches!(
        workspace.begin_export(now()),
        Err(WorkspaceError::Export(ExportError::InvalidTransition { .. }))
    ));
    workspace.open_template_picker().expect("picker");
    let ticket = workspace.begin_export(now()).expect("begin");
    assert_eq!(
        ticket.request.filename,
        ArchiveFilename::from("meeting_minutes_1700000000000.pdf")
    );
}

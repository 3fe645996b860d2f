use std::fmt::Write as _;

use client_core::archive::{format_created_at, template_label};
use shared::domain::{MinutesDocument, PdfTemplate, TemplateId, UserFile};

pub fn minutes_text(doc: &MinutesDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", doc.display_title());
    if let Some(date) = doc.date.as_deref().filter(|d| !d.trim().is_empty()) {
        let _ = writeln!(out, "Date: {date}");
    }
    if !doc.attendees.is_empty() {
        let _ = writeln!(out, "Attendees: {}", doc.attendees.join(", "));
    }
    if let Some(summary) = doc.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        let _ = writeln!(out, "\n## Summary\n{summary}");
    }
    if !doc.discussion_points.is_empty() {
        let _ = writeln!(out, "\n## Discussion Points");
        for point in &doc.discussion_points {
            let _ = writeln!(out, "- {}: {}", point.topic, point.details);
        }
    }
    bullet_section(&mut out, "Decisions", &doc.decisions);
    if !doc.action_items.is_empty() {
        let _ = writeln!(out, "\n## Action Items");
        for item in &doc.action_items {
            let owner = if item.owner.trim().is_empty() {
                "unassigned"
            } else {
                item.owner.as_str()
            };
            match item.due_date.as_deref().filter(|d| !d.trim().is_empty()) {
                Some(due) => {
                    let _ = writeln!(out, "- [ ] {} ({owner}, due {due})", item.task);
                }
                None => {
                    let _ = writeln!(out, "- [ ] {} ({owner})", item.task);
                }
            }
        }
    }
    bullet_section(&mut out, "Next Steps", &doc.next_steps);
    out
}

fn bullet_section(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n## {heading}");
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
}

pub fn templates_text(templates: &[PdfTemplate], default_template: &TemplateId) -> String {
    let mut out = String::new();
    for template in templates {
        let marker = if &template.id == default_template { "*" } else { " " };
        let _ = writeln!(
            out,
            "{marker} {:<14} {:<14} {}",
            template.id.as_str(),
            template.name,
            template.description
        );
    }
    out
}

pub fn files_text(files: &[UserFile]) -> String {
    if files.is_empty() {
        return "No saved files yet.\n".to_string();
    }
    let mut out = String::new();
    for file in files {
        let _ = writeln!(
            out,
            "{}  {}  [{}]  {}",
            file.filename,
            file.title.as_deref().unwrap_or("Meeting Minutes"),
            template_label(file.template.as_ref()),
            format_created_at(file),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{ActionItem, DiscussionPoint};

    #[test]
    fn minutes_text_skips_empty_sections() {
        let doc = MinutesDocument {
            attendees: vec!["Ana".into(), "Bo".into()],
            discussion_points: vec![DiscussionPoint {
                topic: "Budget".into(),
                details: "Approved".into(),
            }],
            action_items: vec![
                ActionItem {
                    task: "Send notes".into(),
                    owner: "Bo".into(),
                    due_date: Some("Friday".into()),
                },
                ActionItem {
                    task: "Book room".into(),
                    owner: String::new(),
                    due_date: None,
                },
            ],
            ..MinutesDocument::default()
        };
        let text = minutes_text(&doc);
        assert!(text.starts_with("# Meeting Minutes\n"));
        assert!(text.contains("Attendees: Ana, Bo"));
        assert!(text.contains("- Budget: Approved"));
        assert!(text.contains("- [ ] Send notes (Bo, due Friday)"));
        assert!(text.contains("- [ ] Book room (unassigned)"));
        assert!(!text.contains("## Decisions"));
        assert!(!text.contains("## Summary"));
    }

    #[test]
    fn files_text_uses_labels_and_dates() {
        let files = vec![UserFile {
            filename: "meeting_minutes_1.pdf".into(),
            title: None,
            template: Some("minimal".into()),
            created_at: None,
        }];
        assert_eq!(
            files_text(&files),
            "meeting_minutes_1.pdf  Meeting Minutes  [Minimal]  Unknown date\n"
        );
        assert_eq!(files_text(&[]), "No saved files yet.\n");
    }
}

use super::*;

fn sample() -> MinutesDocument {
    MinutesDocument {
        title: Some("Weekly sync".into()),
        date: Some("Monday".into()),
        attendees: vec!["Ana".into(), "Bo".into()],
        summary: Some("Status round".into()),
        discussion_points: vec![DiscussionPoint {
            topic: "Budget".into(),
            details: "Over by 5%".into(),
        }],
        decisions: vec!["Freeze hiring".into(), "Move launch".into()],
        action_items: vec![
            ActionItem {
                task: "Draft memo".into(),
                owner: "Ana".into(),
                due_date: Some("Friday".into()),
            },
            ActionItem {
                task: "Book room".into(),
                owner: "Bo".into(),
                due_date: None,
            },
        ],
        next_steps: vec!["Review next week".into()],
    }
}

#[test]
fn parse_attendees_trims_and_drops_blank_segments() {
    assert_eq!(
        parse_attendees(" Ana ,Bo,, , Cy "),
        vec!["Ana".to_string(), "Bo".to_string(), "Cy".to_string()]
    );
    assert!(parse_attendees(" , ,").is_empty());
}

#[test]
fn set_scalar_replaces_only_that_field() {
    let mut doc = sample();
    MinutesEdit::set(ScalarField::Summary, "Short")
        .apply_to(&mut doc)
        .expect("edit");
    let mut expected = sample();
    expected.summary = Some("Short".into());
    assert_eq!(doc, expected);
}

#[test]
fn update_list_item_replaces_in_place_position() {
    let mut doc = sample();
    MinutesEdit::UpdateListItem {
        field: TextListField::Decisions,
        index: 1,
        value: "Keep launch date".into(),
    }
    .apply_to(&mut doc)
    .expect("edit");
    assert_eq!(doc.decisions, vec!["Freeze hiring", "Keep launch date"]);
}

#[test]
fn update_struct_item_touches_only_named_key() {
    let mut doc = sample();
    MinutesEdit::UpdateStructItem {
        field: StructField::ActionItem(ActionItemKey::Owner),
        index: 0,
        value: "Alice".into(),
    }
    .apply_to(&mut doc)
    .expect("edit");

    let original = sample();
    assert_eq!(doc.action_items[0].owner, "Alice");
    assert_eq!(doc.action_items[0].task, original.action_items[0].task);
    assert_eq!(doc.action_items[0].due_date, original.action_items[0].due_date);
    assert_eq!(doc.action_items[1], original.action_items[1]);
}

#[test]
fn append_uses_empty_item_for_each_list() {
    let mut doc = MinutesDocument::default();
    for field in [
        ListField::DiscussionPoints,
        ListField::Decisions,
        ListField::ActionItems,
        ListField::NextSteps,
    ] {
        MinutesEdit::AppendItem(field)
            .apply_to(&mut doc)
            .expect("append");
    }
    assert_eq!(doc.discussion_points, vec![DiscussionPoint::default()]);
    assert_eq!(doc.decisions, vec![String::new()]);
    assert_eq!(
        doc.action_items,
        vec![ActionItem {
            task: String::new(),
            owner: String::new(),
            due_date: Some(String::new()),
        }]
    );
    assert_eq!(doc.next_steps, vec![String::new()]);
}

#[test]
fn remove_shifts_later_items_down() {
    let mut doc = sample();
    MinutesEdit::RemoveItem {
        field: ListField::ActionItems,
        index: 0,
    }
    .apply_to(&mut doc)
    .expect("remove");
    assert_eq!(doc.action_items.len(), 1);
    assert_eq!(doc.action_items[0].task, "Book room");
}

#[test]
fn out_of_range_index_is_rejected_without_touching_draft() {
    let mut doc = sample();
    let err = MinutesEdit::RemoveItem {
        field: ListField::NextSteps,
        index: 1,
    }
    .apply_to(&mut doc)
    .expect_err("index 1 of a one-item list");
    assert_eq!(
        err,
        EditError::IndexOutOfRange {
            field: ListField::NextSteps,
            index: 1,
            len: 1,
        }
    );

    let err = MinutesEdit::UpdateStructItem {
        field: StructField::DiscussionPoint(DiscussionPointKey::Topic),
        index: 3,
        value: "x".into(),
    }
    .apply_to(&mut doc)
    .expect_err("out of range");
    assert!(matches!(err, EditError::IndexOutOfRange { index: 3, .. }));
    assert_eq!(doc, sample());
}

#[test]
fn attendees_from_text_replaces_whole_list() {
    let mut doc = sample();
    MinutesEdit::attendees_from_text("Cy, Dee")
        .apply_to(&mut doc)
        .expect("edit");
    assert_eq!(doc.attendees, vec!["Cy", "Dee"]);
}

#[test]
fn list_len_reports_each_list() {
    let doc = sample();
    assert_eq!(list_len(&doc, ListField::DiscussionPoints), 1);
    assert_eq!(list_len(&doc, ListField::Decisions), 2);
    assert_eq!(list_len(&doc, ListField::ActionItems), 2);
    assert_eq!(list_len(&doc, ListField::NextSteps), 1);
}

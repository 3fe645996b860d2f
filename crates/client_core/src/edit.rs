//! Structural edits applied to a minutes draft.
//!
//! Every edit validates first and then swaps in a freshly built container for the
//! touched field, so a failed edit leaves the draft exactly as it was and no list is
//! ever observed half-updated.

use std::fmt;

use shared::domain::{ActionItem, DiscussionPoint, MinutesDocument};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no active edit session")]
    NoActiveSession,
    #[error("an edit session is already active")]
    SessionAlreadyActive,
    #[error("no committed minutes to edit")]
    NoDocument,
    #[error("{field} index {index} is out of range (length {len})")]
    IndexOutOfRange {
        field: ListField,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    Title,
    Date,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextListField {
    Decisions,
    NextSteps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListField {
    DiscussionPoints,
    Decisions,
    ActionItems,
    NextSteps,
}

impl From<TextListField> for ListField {
    fn from(value: TextListField) -> Self {
        match value {
            TextListField::Decisions => ListField::Decisions,
            TextListField::NextSteps => ListField::NextSteps,
        }
    }
}

impl fmt::Display for ListField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ListField::DiscussionPoints => "discussion_points",
            ListField::Decisions => "decisions",
            ListField::ActionItems => "action_items",
            ListField::NextSteps => "next_steps",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscussionPointKey {
    Topic,
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionItemKey {
    Task,
    Owner,
    DueDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructField {
    DiscussionPoint(DiscussionPointKey),
    ActionItem(ActionItemKey),
}

impl StructField {
    pub fn list(self) -> ListField {
        match self {
            StructField::DiscussionPoint(_) => ListField::DiscussionPoints,
            StructField::ActionItem(_) => ListField::ActionItems,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinutesEdit {
    SetScalar {
        field: ScalarField,
        value: String,
    },
    SetAttendees(Vec<String>),
    UpdateListItem {
        field: TextListField,
        index: usize,
        value: String,
    },
    UpdateStructItem {
        field: StructField,
        index: usize,
        value: String,
    },
    /// Appends the list's empty item: `""`, an empty discussion point, or an empty action item.
    AppendItem(ListField),
    RemoveItem {
        field: ListField,
        index: usize,
    },
}

impl MinutesEdit {
    pub fn set(field: ScalarField, value: impl Into<String>) -> Self {
        MinutesEdit::SetScalar {
            field,
            value: value.into(),
        }
    }

    pub fn attendees_from_text(text: &str) -> Self {
        MinutesEdit::SetAttendees(parse_attendees(text))
    }

    pub fn apply_to(&self, draft: &mut MinutesDocument) -> Result<(), EditError> {
        match self {
            MinutesEdit::SetScalar { field, value } => {
                let slot = match field {
                    ScalarField::Title => &mut draft.title,
                    ScalarField::Date => &mut draft.date,
                    ScalarField::Summary => &mut draft.summary,
                };
                *slot = Some(value.clone());
            }
            MinutesEdit::SetAttendees(attendees) => {
                draft.attendees = attendees.clone();
            }
            MinutesEdit::UpdateListItem {
                field,
                index,
                value,
            } => {
                let list = match field {
                    TextListField::Decisions => &mut draft.decisions,
                    TextListField::NextSteps => &mut draft.next_steps,
                };
                *list = replaced(&list[..], (*field).into(), *index, |_| value.clone())?;
            }
            MinutesEdit::UpdateStructItem {
                field,
                index,
                value,
            } => match field {
                StructField::DiscussionPoint(key) => {
                    draft.discussion_points = replaced(
                        &draft.discussion_points,
                        field.list(),
                        *index,
                        |point| {
                            let mut point = point.clone();
                            match key {
                                DiscussionPointKey::Topic => point.topic = value.clone(),
                                DiscussionPointKey::Details => point.details = value.clone(),
                            }
                            point
                        },
                    )?;
                }
                StructField::ActionItem(key) => {
                    draft.action_items =
                        replaced(&draft.action_items, field.list(), *index, |item| {
                            let mut item = item.clone();
                            match key {
                                ActionItemKey::Task => item.task = value.clone(),
                                ActionItemKey::Owner => item.owner = value.clone(),
                                ActionItemKey::DueDate => item.due_date = Some(value.clone()),
                            }
                            item
                        })?;
                }
            },
            MinutesEdit::AppendItem(field) => match field {
                ListField::DiscussionPoints => {
                    draft.discussion_points =
                        appended(&draft.discussion_points, DiscussionPoint::default());
                }
                ListField::Decisions => {
                    draft.decisions = appended(&draft.decisions, String::new());
                }
                ListField::ActionItems => {
                    draft.action_items = appended(
                        &draft.action_items,
                        ActionItem {
                            due_date: Some(String::new()),
                            ..ActionItem::default()
                        },
                    );
                }
                ListField::NextSteps => {
                    draft.next_steps = appended(&draft.next_steps, String::new());
                }
            },
            MinutesEdit::RemoveItem { field, index } => match field {
                ListField::DiscussionPoints => {
                    draft.discussion_points = removed(&draft.discussion_points, *field, *index)?;
                }
                ListField::Decisions => {
                    draft.decisions = removed(&draft.decisions, *field, *index)?;
                }
                ListField::ActionItems => {
                    draft.action_items = removed(&draft.action_items, *field, *index)?;
                }
                ListField::NextSteps => {
                    draft.next_steps = removed(&draft.next_steps, *field, *index)?;
                }
            },
        }
        Ok(())
    }
}

pub fn parse_attendees(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn list_len(doc: &MinutesDocument, field: ListField) -> usize {
    match field {
        ListField::DiscussionPoints => doc.discussion_points.len(),
        ListField::Decisions => doc.decisions.len(),
        ListField::ActionItems => doc.action_items.len(),
        ListField::NextSteps => doc.next_steps.len(),
    }
}

fn check_index(field: ListField, index: usize, len: usize) -> Result<(), EditError> {
    if index < len {
        Ok(())
    } else {
        Err(EditError::IndexOutOfRange { field, index, len })
    }
}

fn replaced<T: Clone>(
    items: &[T],
    field: ListField,
    index: usize,
    update: impl FnOnce(&T) -> T,
) -> Result<Vec<T>, EditError> {
    check_index(field, index, items.len())?;
    let mut next = items.to_vec();
    next[index] = update(&items[index]);
    Ok(next)
}

fn appended<T: Clone>(items: &[T], item: T) -> Vec<T> {
    let mut next = Vec::with_capacity(items.len() + 1);
    next.extend_from_slice(items);
    next.push(item);
    next
}

fn removed<T: Clone>(items: &[T], field: ListField, index: usize) -> Result<Vec<T>, EditError> {
    check_index(field, index, items.len())?;
    Ok(items
        .iter()
        .enumerate()
        .filter(|(position, _)| *position != index)
        .map(|(_, item)| item.clone())
        .collect())
}

#[cfg(test)]
#[path = "tests/edit_tests.rs"]
mod tests;

use shared::domain::MinutesDocument;
use tracing::debug;

use crate::edit::{EditError, MinutesEdit};

#[derive(Debug, Clone)]
struct EditSession {
    draft: MinutesDocument,
    revision: u64,
}

/// Owns the committed document and at most one draft of it.
///
/// The committed document is only ever replaced wholesale: by [`commit`](Self::commit)
/// or by a freshly generated document. Edits go to the draft.
#[derive(Debug, Clone, Default)]
pub struct MinutesDraftStore {
    committed: Option<MinutesDocument>,
    session: Option<EditSession>,
}

impl MinutesDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed(&self) -> Option<&MinutesDocument> {
        self.committed.as_ref()
    }

    pub fn draft(&self) -> Option<&MinutesDocument> {
        self.session.as_ref().map(|session| &session.draft)
    }

    pub fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    pub fn draft_revision(&self) -> Option<u64> {
        self.session.as_ref().map(|session| session.revision)
    }

    pub fn start_edit(&mut self) -> Result<&MinutesDocument, EditError> {
        if self.session.is_some() {
            return Err(EditError::SessionAlreadyActive);
        }
        let committed = self.committed.as_ref().ok_or(EditError::NoDocument)?;
        let session = self.session.insert(EditSession {
            draft: committed.clone(),
            revision: 0,
        });
        debug!("edit session started");
        Ok(&session.draft)
    }

    pub fn apply(&mut self, edit: &MinutesEdit) -> Result<&MinutesDocument, EditError> {
        let session = self.session.as_mut().ok_or(EditError::NoActiveSession)?;
        edit.apply_to(&mut session.draft)?;
        session.revision += 1;
        Ok(&session.draft)
    }

    pub fn commit(&mut self) -> Result<&MinutesDocument, EditError> {
        let session = self.session.take().ok_or(EditError::NoActiveSession)?;
        debug!(revision = session.revision, "edit session committed");
        Ok(self.committed.insert(session.draft))
    }

    pub fn discard(&mut self) -> Result<(), EditError> {
        let session = self.session.take().ok_or(EditError::NoActiveSession)?;
        debug!(revision = session.revision, "edit session discarded");
        Ok(())
    }

    pub fn replace_with_new_document(&mut self, doc: MinutesDocument) {
        self.session = None;
        self.committed = Some(doc);
    }

    pub fn clear(&mut self) {
        self.session = None;
        self.committed = None;
    }
}

#[cfg(test)]
#[path = "tests/draft_tests.rs"]
mod tests;

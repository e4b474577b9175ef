//! Document mutations.

use super::{EntityKind, StoreError, StoreResult, StoreState};
use crate::model::dedupe_ids;
use crate::model::document::{Document, DocumentId, DocumentPatch, NewDocument};
use crate::model::validation::require_title;
use crate::model::EpochMs;
use uuid::Uuid;

impl StoreState {
    pub fn insert_document(&mut self, input: NewDocument, now: EpochMs) -> StoreResult<Document> {
        require_title(&input.title)?;
        let mut tags = input.tags;
        dedupe_ids(&mut tags);
        self.check_tags(&tags)?;
        self.check_project(input.project_id)?;

        let document = Document {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            content: input.content,
            tags,
            project_id: input.project_id,
            created_at: now,
            updated_at: now,
        };
        self.documents.push(document.clone());
        Ok(document)
    }

    pub fn update_document(
        &mut self,
        id: DocumentId,
        patch: DocumentPatch,
        now: EpochMs,
    ) -> StoreResult<Document> {
        let index = self.document_index(id)?;
        let mut next = self.documents[index].clone();

        if let Some(title) = patch.title {
            require_title(&title)?;
            next.title = title.trim().to_string();
        }
        if let Some(mut tags) = patch.tags {
            dedupe_ids(&mut tags);
            self.check_tags(&tags)?;
            next.tags = tags;
        }
        if let Some(project_id) = patch.project_id {
            self.check_project(project_id)?;
            next.project_id = project_id;
        }
        if let Some(content) = patch.content {
            next.content = content;
        }
        next.updated_at = now;

        self.documents[index] = next.clone();
        Ok(next)
    }

    pub fn remove_document(&mut self, id: DocumentId) -> StoreResult<Document> {
        let index = self.document_index(id)?;
        Ok(self.documents.remove(index))
    }

    fn document_index(&self, id: DocumentId) -> StoreResult<usize> {
        self.documents
            .iter()
            .position(|doc| doc.id == id)
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Document,
                id,
            })
    }
}

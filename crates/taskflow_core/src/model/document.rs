//! Document model. Content is opaque rich text owned by the editor.

use crate::model::project::ProjectId;
use crate::model::tag::TagId;
use crate::model::EpochMs;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DocumentId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<TagId>,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    pub created_at: EpochMs,
    pub updated_at: EpochMs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub tags: Vec<TagId>,
    pub project_id: Option<ProjectId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<TagId>>,
    pub project_id: Option<Option<ProjectId>>,
}

use chrono::{DateTime, Utc};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::dates;
use crate::model::entity_ref::{EntityId, EntityRef};
use crate::model::Resource;
use crate::validation::{Checks, Validate, ValidationErrors};

/// Uploaded study material (a PDF).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(
        default,
        deserialize_with = "dates::optional_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Note {
    type Draft = NoteDraft;

    const PATH: &'static str = "/notes";
    const NOUN: &'static str = "note";
    const PLURAL: &'static str = "notes";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

/// Metadata of a note. The file itself only travels with an upload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Setters)]
#[serde(rename_all = "camelCase")]
#[setters(into, strip_option)]
pub struct NoteDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<EntityId>,
}

impl Validate for NoteDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = Checks::default();
        checks.required("title", &self.title);
        if self.subject.is_none() {
            checks.fail("subject", "Subject is required");
        }
        checks.finish()
    }
}

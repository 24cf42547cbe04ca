use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::entity_ref::{EntityId, EntityRef};
use crate::model::Resource;
use crate::validation::{Checks, Validate, ValidationErrors};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Subject {
    type Draft = SubjectDraft;

    const PATH: &'static str = "/subjects";
    const NOUN: &'static str = "subject";
    const PLURAL: &'static str = "subjects";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Setters)]
#[serde(rename_all = "camelCase")]
#[setters(into, strip_option)]
pub struct SubjectDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Validate for SubjectDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = Checks::default();
        checks.required("name", &self.name);
        if self.standard.is_none() {
            checks.fail("standard", "Standard is required");
        }
        checks.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_validation() {
        let errors = SubjectDraft::default().name("Physics").validate().unwrap_err();
        assert_eq!(errors.get("standard"), Some("Standard is required"));
        assert!(SubjectDraft::default()
            .name("Physics")
            .standard(EntityId::new("std11"))
            .validate()
            .is_ok());
    }
}

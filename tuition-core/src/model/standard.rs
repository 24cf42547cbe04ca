use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::entity_ref::{EntityId, EntityRef};
use crate::model::Resource;
use crate::validation::{Checks, Validate, ValidationErrors};

/// A grade level, e.g. "Class 11".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standard {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub subjects: Vec<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Standard {
    type Draft = StandardDraft;

    const PATH: &'static str = "/standards";
    const NOUN: &'static str = "standard";
    const PLURAL: &'static str = "standards";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Setters)]
#[serde(rename_all = "camelCase")]
#[setters(into, strip_option)]
pub struct StandardDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub subjects: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for StandardDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Checks::default().required("name", &self.name).finish()
    }
}

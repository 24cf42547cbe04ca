use chrono::{DateTime, NaiveDate, Utc};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::dates;
use crate::model::entity_ref::{self, EntityId, EntityRef};
use crate::model::Resource;
use crate::validation::{Checks, Validate, ValidationErrors};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<EntityRef>,
    #[serde(default)]
    pub subjects: Vec<EntityRef>,
    #[serde(default)]
    pub batches: Vec<EntityRef>,
    #[serde(
        default,
        deserialize_with = "dates::optional_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub enrollment_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Student {
    pub fn new<I: Into<EntityId>, N: Into<String>>(id: I, name: N) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            phone: None,
            parent_name: None,
            parent_phone: None,
            address: None,
            standard: None,
            subjects: Vec::new(),
            batches: Vec::new(),
            enrollment_date: None,
            extra: Map::new(),
        }
    }

    pub fn in_batch(&self, batch: &EntityId) -> bool {
        entity_ref::contains(&self.batches, batch)
    }

    pub fn takes_subject(&self, subject: &EntityId) -> bool {
        entity_ref::contains(&self.subjects, subject)
    }

    pub fn join_batch(&mut self, batch: &EntityId) {
        if !self.in_batch(batch) {
            self.batches.push(EntityRef::Id(batch.clone()));
        }
    }

    pub fn leave_batch(&mut self, batch: &EntityId) {
        self.batches.retain(|entry| !entry.refers_to(batch));
    }
}

impl Resource for Student {
    type Draft = StudentDraft;

    const PATH: &'static str = "/students";
    const NOUN: &'static str = "student";
    const PLURAL: &'static str = "students";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Setters)]
#[serde(rename_all = "camelCase")]
#[setters(into, strip_option)]
pub struct StudentDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<EntityId>,
    #[serde(default)]
    pub subjects: Vec<EntityId>,
    #[serde(default)]
    pub batches: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_date: Option<NaiveDate>,
}

impl Validate for StudentDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = Checks::default();
        checks
            .required("name", &self.name)
            .email("email", self.email.as_deref())
            .phone("phone", self.phone.as_deref())
            .phone("parentPhone", self.parent_phone.as_deref());
        if self.standard.is_none() {
            checks.fail("standard", "Standard is required");
        }
        checks.finish()
    }
}

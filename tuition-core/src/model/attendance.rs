use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::dates;
use crate::model::entity_ref::{EntityId, EntityRef};
use crate::model::Resource;
use crate::validation::{Checks, Validate, ValidationErrors};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub student: EntityRef,
    #[serde(default)]
    pub status: AttendanceStatus,
}

/// Attendance of one batch on one day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub batch: EntityRef,
    #[serde(deserialize_with = "dates::date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub records: Vec<AttendanceEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AttendanceRecord {
    pub fn count(&self, status: AttendanceStatus) -> usize {
        self.records
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    }
}

impl Resource for AttendanceRecord {
    type Draft = AttendanceDraft;

    const PATH: &'static str = "/attendance";
    const NOUN: &'static str = "attendance";
    const PLURAL: &'static str = "attendance";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttendanceMark {
    pub student: EntityId,
    pub status: AttendanceStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttendanceDraft {
    pub batch: EntityId,
    pub date: NaiveDate,
    pub records: Vec<AttendanceMark>,
}

impl Validate for AttendanceDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = Checks::default();
        checks.required("batch", self.batch.as_str());
        if self.records.is_empty() {
            checks.fail("records", "Mark at least one student");
        }
        let mut seen = std::collections::HashSet::new();
        if self.records.iter().any(|mark| !seen.insert(&mark.student)) {
            checks.fail("records", "A student is marked more than once");
        }
        checks.finish()
    }
}

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::anyhow;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::entity_ref::{self, EntityId, EntityRef};
use crate::model::Resource;
use crate::store::merge::merge_batches;
use crate::validation::{parse_time, Checks, Validate, ValidationErrors};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    #[default]
    Upcoming,
    Active,
    Completed,
    Cancelled,
}

impl FromStr for BatchStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Ok(BatchStatus::Upcoming),
            "active" => Ok(BatchStatus::Active),
            "completed" => Ok(BatchStatus::Completed),
            "cancelled" | "canceled" => Ok(BatchStatus::Cancelled),
            other => Err(anyhow!("Unknown batch status: {}", other)),
        }
    }
}

impl Display for BatchStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Upcoming => f.write_str("upcoming"),
            BatchStatus::Active => f.write_str("active"),
            BatchStatus::Completed => f.write_str("completed"),
            BatchStatus::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<f64>,
    #[serde(default)]
    pub status: BatchStatus,
    /// `None` when the listing was not asked to populate the relationship.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_students: Option<Vec<EntityRef>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Batch {
    pub fn new<I: Into<EntityId>, N: Into<String>>(id: I, name: N) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            standard: None,
            subject: None,
            teacher: None,
            schedule: None,
            capacity: None,
            fees: None,
            status: BatchStatus::default(),
            enrolled_students: None,
            extra: Map::new(),
        }
    }

    pub fn enrolled_count(&self) -> usize {
        self.enrolled_students.as_ref().map_or(0, Vec::len)
    }

    pub fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|capacity| self.enrolled_count() >= capacity as usize)
    }

    pub fn has_student(&self, student: &EntityId) -> bool {
        self.enrolled_students
            .as_deref()
            .is_some_and(|students| entity_ref::contains(students, student))
    }

    /// Makes sure `student` is listed, keeping the list as it is otherwise.
    pub fn ensure_enrolled(&mut self, student: &EntityId) {
        if !self.has_student(student) {
            self.enrolled_students
                .get_or_insert_with(Vec::new)
                .push(EntityRef::Id(student.clone()));
        }
    }

    pub fn ensure_unenrolled(&mut self, student: &EntityId) {
        if let Some(students) = self.enrolled_students.as_mut() {
            students.retain(|entry| !entry.refers_to(student));
        }
    }
}

impl Resource for Batch {
    type Draft = BatchDraft;

    const PATH: &'static str = "/batches";
    const NOUN: &'static str = "batch";
    const PLURAL: &'static str = "batches";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn reconcile(previous: &[Self], incoming: Vec<Self>) -> Vec<Self> {
        merge_batches(previous, incoming)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Setters)]
#[serde(rename_all = "camelCase")]
#[setters(into)]
pub struct BatchDraft {
    pub name: String,
    #[setters(strip_option)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<EntityId>,
    #[setters(strip_option)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<EntityId>,
    #[setters(strip_option)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<EntityId>,
    pub schedule: Schedule,
    #[setters(strip_option)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[setters(strip_option)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<f64>,
    pub status: BatchStatus,
}

impl From<&Batch> for BatchDraft {
    fn from(batch: &Batch) -> Self {
        let id = |entry: &Option<EntityRef>| entry.as_ref().map(|entry| entry.id().clone());
        Self {
            name: batch.name.clone(),
            standard: id(&batch.standard),
            subject: id(&batch.subject),
            teacher: id(&batch.teacher),
            schedule: batch.schedule.clone().unwrap_or_default(),
            capacity: batch.capacity,
            fees: batch.fees,
            status: batch.status,
        }
    }
}

impl Validate for BatchDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = Checks::default();
        checks.required("name", &self.name);
        if self.subject.is_none() {
            checks.fail("subject", "Subject is required");
        }
        if self.capacity == Some(0) {
            checks.fail("capacity", "Capacity must be at least 1");
        }
        if self.fees.is_some_and(|fees| fees < 0.0 || !fees.is_finite()) {
            checks.fail("fees", "Fees cannot be negative");
        }

        let start = self.schedule.start_time.as_deref();
        let end = self.schedule.end_time.as_deref();
        match (start.map(parse_time), end.map(parse_time)) {
            (Some(None), _) => {
                checks.fail("schedule.startTime", "Use HH:MM");
            }
            (_, Some(None)) => {
                checks.fail("schedule.endTime", "Use HH:MM");
            }
            (Some(Some(start)), Some(Some(end))) if end <= start => {
                checks.fail("schedule.endTime", "End time must be after start time");
            }
            _ => {}
        }
        checks.finish()
    }
}

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::validation::Validate;

pub mod attendance;
pub mod batch;
mod dates;
pub mod entity_ref;
pub mod note;
pub mod standard;
pub mod student;
pub mod subject;
pub mod video;

pub use attendance::{
    AttendanceDraft, AttendanceEntry, AttendanceMark, AttendanceRecord, AttendanceStatus,
};
pub use batch::{Batch, BatchDraft, BatchStatus, Schedule};
pub use entity_ref::{Embedded, EntityId, EntityRef};
pub use note::{Note, NoteDraft};
pub use standard::{Standard, StandardDraft};
pub use student::{Student, StudentDraft};
pub use subject::{Subject, SubjectDraft};
pub use video::{Video, VideoDraft};

/// An entity the API exposes as a REST collection under [`Resource::PATH`].
pub trait Resource: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Body sent on create and update.
    type Draft: Serialize + Validate + Send + Sync;

    const PATH: &'static str;
    const NOUN: &'static str;
    const PLURAL: &'static str;

    fn id(&self) -> &EntityId;

    /// Combines a fresh listing with what was held before it. The default
    /// trusts the server completely.
    fn reconcile(_previous: &[Self], incoming: Vec<Self>) -> Vec<Self> {
        incoming
    }

    fn item_path(id: &EntityId) -> String {
        format!("{}/{}", Self::PATH, id.segment())
    }
}

use crate::model::{AttendanceRecord, Batch, Note, Resource, Standard, Student, Subject, Video};
use crate::store::slice::EntitySlice;

/// Everything the client holds, one slice per entity.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub batches: EntitySlice<Batch>,
    pub students: EntitySlice<Student>,
    pub standards: EntitySlice<Standard>,
    pub subjects: EntitySlice<Subject>,
    pub notes: EntitySlice<Note>,
    pub videos: EntitySlice<Video>,
    pub attendance: EntitySlice<AttendanceRecord>,
}

/// A resource with a slice in [`AppState`].
pub trait Stored: Resource {
    fn slice(state: &AppState) -> &EntitySlice<Self>;
    fn slice_mut(state: &mut AppState) -> &mut EntitySlice<Self>;
}

macro_rules! stored {
    ($($resource:ty => $field:ident),* $(,)?) => {
        $(
            impl Stored for $resource {
                fn slice(state: &AppState) -> &EntitySlice<Self> {
                    &state.$field
                }

                fn slice_mut(state: &mut AppState) -> &mut EntitySlice<Self> {
                    &mut state.$field
                }
            }
        )*
    };
}

stored! {
    Batch => batches,
    Student => students,
    Standard => standards,
    Subject => subjects,
    Note => notes,
    Video => videos,
    AttendanceRecord => attendance,
}

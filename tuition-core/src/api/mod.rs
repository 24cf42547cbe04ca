//! Typed calls against the REST API. Nothing here touches the store.

pub mod attendance;
pub mod auth;
pub mod batches;
pub mod notes;
pub mod resource;

pub use attendance::AttendanceApi;
pub use auth::AuthApi;
pub use batches::{BatchApi, Enrollment};
pub use notes::{NoteUpload, NotesApi, UploadProgress};
pub use resource::ResourceApi;

/// Parameters of a listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pub params: Vec<(String, String)>,
    /// Trust the listing as-is instead of reconciling it with what is held.
    pub force_refresh: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Asks the API to embed `field` instead of returning bare ids.
    pub fn populate<F: Into<String>>(self, field: F) -> Self {
        self.param("populate", field)
    }

    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }
}

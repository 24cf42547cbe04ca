use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tuition_auth::session::Session;

use crate::api::{
    AttendanceApi, BatchApi, Enrollment, NoteUpload, NotesApi, Query, ResourceApi, UploadProgress,
};
use crate::app_ctx::AppContext;
use crate::blueprint::Upload;
use crate::http::{ApiClient, ApiError};
use crate::model::{AttendanceRecord, Batch, EntityId, Note, Resource, Student};
use crate::store::merge::merge_batches;
use crate::store::state::{AppState, Stored};
use crate::validation::{FieldError, ValidationErrors};

/// What can be done to a collection.
pub enum Command<R: Resource> {
    FetchAll(Query),
    FetchOne(EntityId),
    Create(R::Draft),
    Update(EntityId, R::Draft),
    Delete(EntityId),
}

impl<R: Resource> Command<R> {
    fn failure(&self) -> String {
        match self {
            Command::FetchAll(_) => format!("Failed to fetch {}", R::PLURAL),
            Command::FetchOne(_) => format!("Failed to fetch {}", R::NOUN),
            Command::Create(_) => format!("Failed to create {}", R::NOUN),
            Command::Update(..) => format!("Failed to update {}", R::NOUN),
            Command::Delete(_) => format!("Failed to delete {}", R::NOUN),
        }
    }
}

/// Outcome of a command. Failures carry the message that was also stored
/// in the slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Loaded { count: usize },
    Fetched(EntityId),
    Created(EntityId),
    Updated(EntityId),
    Deleted(EntityId),
    Enrolled { batch: EntityId, student: EntityId },
    Unenrolled { batch: EntityId, student: EntityId },
    Uploaded(EntityId),
    Cancelled,
    Failed(String),
}

impl Event {
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::Failed(_))
    }
}

/// Owns the [`AppState`] and is the only thing that changes it. Commands
/// run one at a time and each one settles the slice it touched.
pub struct Store {
    api: ApiClient,
    limits: Upload,
    state: AppState,
    root: CancellationToken,
}

impl Store {
    pub fn new(api: ApiClient, limits: Upload) -> Self {
        Self {
            api,
            limits,
            state: AppState::default(),
            root: CancellationToken::new(),
        }
    }

    pub fn from_context(app_ctx: &AppContext, session: Arc<Session>) -> Self {
        Self::new(
            ApiClient::from_context(app_ctx, session),
            app_ctx.blueprint.upload,
        )
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Token that cancels whatever command is in flight when it fires.
    pub fn canceller(&self) -> CancellationToken {
        self.root.clone()
    }

    pub fn clear_status<R: Stored>(&mut self) {
        R::slice_mut(&mut self.state).clear_status();
    }

    /// Drops everything held, e.g. after signing out.
    pub fn reset(&mut self) {
        self.state = AppState::default();
    }

    fn command_token(&mut self) -> CancellationToken {
        if self.root.is_cancelled() {
            self.root = CancellationToken::new();
        }
        self.root.child_token()
    }

    pub async fn dispatch<R: Stored>(&mut self, command: Command<R>) -> Event {
        let cancel = self.command_token();
        self.dispatch_with(command, cancel).await
    }

    pub async fn dispatch_with<R: Stored>(
        &mut self,
        command: Command<R>,
        cancel: CancellationToken,
    ) -> Event {
        let failure = command.failure();
        R::slice_mut(&mut self.state).pending();
        let result = self.run(command, &cancel).await;
        self.settle::<R>(result, &failure)
    }

    async fn run<R: Stored>(
        &mut self,
        command: Command<R>,
        cancel: &CancellationToken,
    ) -> Result<Event, ApiError> {
        let api = ResourceApi::<R>::new(&self.api);
        match command {
            Command::FetchAll(query) => {
                let incoming = api.list(&query, cancel).await?;
                let slice = R::slice_mut(&mut self.state);
                let items = if query.force_refresh {
                    incoming
                } else {
                    R::reconcile(slice.items(), incoming)
                };
                let count = items.len();
                slice.replace(items);
                Ok(Event::Loaded { count })
            }
            Command::FetchOne(id) => {
                let (item, version) = api.get(&id, cancel).await?;
                let slice = R::slice_mut(&mut self.state);
                let id = item.id().clone();
                slice.upsert(item);
                slice.remember_version(id.clone(), version);
                Ok(Event::Fetched(id))
            }
            Command::Create(draft) => {
                let item = api.create(&draft, cancel).await?;
                let id = item.id().clone();
                R::slice_mut(&mut self.state).upsert(item);
                Ok(Event::Created(id))
            }
            Command::Update(id, draft) => {
                let version = R::slice(&self.state).version(&id).map(str::to_string);
                let (item, version) = api.update(&id, &draft, version, cancel).await?;
                let slice = R::slice_mut(&mut self.state);
                slice.upsert(item);
                slice.remember_version(id.clone(), version);
                Ok(Event::Updated(id))
            }
            Command::Delete(id) => {
                api.delete(&id, cancel).await?;
                R::slice_mut(&mut self.state).remove(&id);
                Ok(Event::Deleted(id))
            }
        }
    }

    fn settle<R: Stored>(&mut self, result: Result<Event, ApiError>, failure: &str) -> Event {
        let slice = R::slice_mut(&mut self.state);
        match result {
            Ok(event) => {
                slice.fulfilled();
                event
            }
            Err(err) if err.is_cancelled() => {
                slice.settled();
                Event::Cancelled
            }
            Err(err) => {
                log::error!("{}: {}", failure, err);
                let message = err.user_message(failure);
                slice.rejected(message.clone());
                Event::Failed(message)
            }
        }
    }

    pub async fn enroll(&mut self, batch: EntityId, student: EntityId) -> Event {
        self.change_enrollment(Enrollment::Add, batch, student).await
    }

    pub async fn unenroll(&mut self, batch: EntityId, student: EntityId) -> Event {
        self.change_enrollment(Enrollment::Remove, batch, student).await
    }

    async fn change_enrollment(
        &mut self,
        action: Enrollment,
        batch: EntityId,
        student: EntityId,
    ) -> Event {
        let cancel = self.command_token();
        self.state.batches.pending();
        let result = self.run_enrollment(action, batch, student, &cancel).await;
        let failure = match action {
            Enrollment::Add => "Failed to add student to batch",
            Enrollment::Remove => "Failed to remove student from batch",
        };
        self.settle::<Batch>(result, failure)
    }

    async fn run_enrollment(
        &mut self,
        action: Enrollment,
        batch: EntityId,
        student: EntityId,
        cancel: &CancellationToken,
    ) -> Result<Event, ApiError> {
        if action == Enrollment::Add {
            let full = self
                .state
                .batches
                .get(&batch)
                .is_some_and(|held| held.is_full() && !held.has_student(&student));
            if full {
                return Err(
                    ValidationErrors::from(vec![FieldError::new("batch", "Batch is full")]).into(),
                );
            }
        }

        let returned = BatchApi::new(&self.api)
            .enrollment(action, &batch, &student, cancel)
            .await?;

        let batches = &mut self.state.batches;
        if let Some(returned) = returned {
            let previous = batches.get(&batch).cloned().into_iter().collect::<Vec<_>>();
            for merged in merge_batches(&previous, vec![returned]) {
                batches.upsert(merged);
            }
        }
        match action {
            Enrollment::Add => {
                if let Some(held) = batches.get_mut(&batch) {
                    held.ensure_enrolled(&student);
                }
                if let Some(held) = self.state.students.get_mut(&student) {
                    held.join_batch(&batch);
                }
                Ok(Event::Enrolled { batch, student })
            }
            Enrollment::Remove => {
                if let Some(held) = batches.get_mut(&batch) {
                    held.ensure_unenrolled(&student);
                }
                if let Some(held) = self.state.students.get_mut(&student) {
                    held.leave_batch(&batch);
                }
                Ok(Event::Unenrolled { batch, student })
            }
        }
    }

    /// Batches teaching `subject`. Leaves the store alone.
    pub async fn batches_by_subject(&self, subject: &EntityId) -> Result<Vec<Batch>, ApiError> {
        BatchApi::new(&self.api)
            .by_subject(subject, &self.root.child_token())
            .await
    }

    /// Replaces the held attendance with that of `batch`.
    pub async fn load_attendance(&mut self, batch: EntityId, date: Option<NaiveDate>) -> Event {
        let cancel = self.command_token();
        self.state.attendance.pending();
        let result = AttendanceApi::new(&self.api)
            .for_batch(&batch, date, &cancel)
            .await
            .map(|records| {
                let count = records.len();
                self.state.attendance.replace(records);
                Event::Loaded { count }
            });
        let failure = format!("Failed to fetch {}", AttendanceRecord::PLURAL);
        self.settle::<AttendanceRecord>(result, &failure)
    }

    pub async fn upload_note(
        &mut self,
        upload: NoteUpload,
        progress: Option<watch::Sender<UploadProgress>>,
    ) -> Event {
        let cancel = self.command_token();
        self.state.notes.pending();
        let result = NotesApi::new(&self.api, self.limits)
            .upload(upload, progress, &cancel)
            .await
            .map(|note| {
                let id = note.id().clone();
                self.state.notes.upsert(note);
                Event::Uploaded(id)
            });
        let failure = format!("Failed to upload {}", Note::NOUN);
        self.settle::<Note>(result, &failure)
    }

    pub fn student(&self, id: &EntityId) -> Option<&Student> {
        self.state.students.get(id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::http::client::tests::api_client;
    use crate::model::{
        AttendanceDraft, AttendanceMark, AttendanceStatus, NoteDraft, Standard, StandardDraft,
        StudentDraft,
    };

    fn store(server: &MockServer) -> Store {
        Store::new(
            api_client(server.base_url()),
            Upload {
                max_file_size: 1024,
                chunk_size: 8,
            },
        )
    }

    fn enrolled(store: &Store, batch: &str) -> Vec<String> {
        store
            .state()
            .batches
            .get(&EntityId::new(batch))
            .and_then(|b| b.enrolled_students.as_ref())
            .map(|students| students.iter().map(|s| s.id().to_string()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_fetch_all_keeps_known_enrollment() {
        let server = MockServer::start();
        let mut populated = server.mock(|when, then| {
            when.method(GET)
                .path("/batches")
                .query_param("populate", "enrolledStudents");
            then.status(200).json_body(json!({"data": [
                {"_id": "b1", "name": "Algebra A", "enrolledStudents": [
                    {"_id": "s1", "name": "Ravi"}, {"_id": "s2", "name": "Meera"}
                ]}
            ]}));
        });

        let mut store = store(&server);
        let event = store
            .dispatch::<Batch>(Command::FetchAll(Query::new().populate("enrolledStudents")))
            .await;
        assert_eq!(event, Event::Loaded { count: 1 });
        populated.delete();

        let mut bare = server.mock(|when, then| {
            when.method(GET).path("/batches");
            then.status(200)
                .json_body(json!([{"_id": "b1", "name": "Algebra A (evening)"}, {"_id": "b2"}]));
        });
        store
            .dispatch::<Batch>(Command::FetchAll(Query::new()))
            .await;

        let batches = store.state().batches.items();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].name, "Algebra A (evening)");
        assert_eq!(enrolled(&store, "b1"), vec!["s1", "s2"]);
        assert!(store.state().batches.success);
        bare.delete();

        server.mock(|when, then| {
            when.method(GET).path("/batches");
            then.status(200)
                .json_body(json!([{"_id": "b1", "enrolledStudents": ["s1"]}]));
        });
        store
            .dispatch::<Batch>(Command::FetchAll(Query::new().force_refresh(true)))
            .await;
        assert_eq!(enrolled(&store, "b1"), vec!["s1"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_stored() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/students");
            then.status(500);
        });
        server.mock(|when, then| {
            when.method(GET).path("/standards");
            then.status(403)
                .json_body(json!({"success": false, "message": "Admins only"}));
        });

        let mut store = store(&server);
        let event = store
            .dispatch::<Student>(Command::FetchAll(Query::new()))
            .await;
        assert_eq!(event, Event::Failed("Failed to fetch students".to_string()));
        let slice = &store.state().students;
        assert!(!slice.loading);
        assert!(!slice.success);
        assert_eq!(slice.error.as_deref(), Some("Failed to fetch students"));

        store
            .dispatch::<Standard>(Command::FetchAll(Query::new()))
            .await;
        assert_eq!(store.state().standards.error.as_deref(), Some("Admins only"));

        store.clear_status::<Standard>();
        assert!(store.state().standards.error.is_none());
    }

    #[tokio::test]
    async fn test_crud_round() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/standards");
            then.status(200)
                .json_body(json!([{"_id": "std9", "name": "Class 9"}]));
        });
        server.mock(|when, then| {
            when.method(POST).path("/standards");
            then.status(201)
                .json_body(json!({"data": {"_id": "std10", "name": "Class 10"}}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/standards/std10");
            then.status(200)
                .header("ETag", "\"v1\"")
                .json_body(json!({"_id": "std10", "name": "Class 10"}));
        });
        let update = server.mock(|when, then| {
            when.method(PUT)
                .path("/standards/std10")
                .header("If-Match", "\"v1\"");
            then.status(200)
                .header("ETag", "\"v2\"")
                .json_body(json!({"_id": "std10", "name": "Class X"}));
        });
        server.mock(|when, then| {
            when.method(DELETE).path("/standards/std9");
            then.status(200).json_body(json!({"success": true}));
        });

        let mut store = store(&server);
        let std10 = EntityId::new("std10");
        store
            .dispatch::<Standard>(Command::FetchAll(Query::new()))
            .await;

        let event = store
            .dispatch::<Standard>(Command::Create(StandardDraft::default().name("Class 10")))
            .await;
        assert_eq!(event, Event::Created(std10.clone()));
        let names = |store: &Store| {
            store
                .state()
                .standards
                .items()
                .iter()
                .map(|s| s.name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&store), vec!["Class 9", "Class 10"]);

        store
            .dispatch::<Standard>(Command::FetchOne(std10.clone()))
            .await;
        let event = store
            .dispatch::<Standard>(Command::Update(
                std10.clone(),
                StandardDraft::default().name("Class X"),
            ))
            .await;
        update.assert();
        assert_eq!(event, Event::Updated(std10.clone()));
        assert_eq!(store.state().standards.version(&std10), Some("\"v2\""));

        let event = store
            .dispatch::<Standard>(Command::Delete(EntityId::new("std9")))
            .await;
        assert_eq!(event, Event::Deleted(EntityId::new("std9")));
        assert_eq!(names(&store), vec!["Class X"]);
    }

    #[tokio::test]
    async fn test_stale_update_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(PUT).path("/standards/std10");
            then.status(412);
        });

        let mut store = store(&server);
        let event = store
            .dispatch::<Standard>(Command::Update(
                EntityId::new("std10"),
                StandardDraft::default().name("Class X"),
            ))
            .await;
        let Event::Failed(message) = event else {
            panic!("expected a failure, got {:?}", event);
        };
        assert!(message.contains("modified by someone else"));
    }

    #[tokio::test]
    async fn test_invalid_draft_never_leaves() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/students");
            then.status(201).json_body(json!({"_id": "s1"}));
        });

        let mut store = store(&server);
        let event = store
            .dispatch::<Student>(Command::Create(StudentDraft::default().name("Ravi")))
            .await;

        assert_eq!(mock.hits(), 0);
        assert_eq!(
            event,
            Event::Failed("standard: Standard is required".to_string())
        );
    }

    #[tokio::test]
    async fn test_cancelled_command_sets_no_outcome() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/videos");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(json!([]));
        });

        let mut store = store(&server);
        let canceller = store.canceller();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let event = store
            .dispatch::<crate::model::Video>(Command::FetchAll(Query::new()))
            .await;
        assert_eq!(event, Event::Cancelled);
        let slice = &store.state().videos;
        assert!(!slice.loading);
        assert!(!slice.success);
        assert!(slice.error.is_none());

        let token = CancellationToken::new();
        token.cancel();
        let event = store
            .dispatch_with::<crate::model::Video>(Command::FetchAll(Query::new()), token)
            .await;
        assert_eq!(event, Event::Cancelled);
    }

    async fn seeded(server: &MockServer, capacity: u32) -> Store {
        server.mock(|when, then| {
            when.method(GET).path("/batches");
            then.status(200).json_body(json!([{
                "_id": "b1",
                "name": "Algebra A",
                "capacity": capacity,
                "enrolledStudents": ["s1"]
            }]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/students");
            then.status(200).json_body(json!([
                {"_id": "s1", "name": "Ravi", "batches": ["b1"]},
                {"_id": "s2", "name": "Meera"}
            ]));
        });
        let mut store = store(server);
        store.dispatch::<Batch>(Command::FetchAll(Query::new())).await;
        store.dispatch::<Student>(Command::FetchAll(Query::new())).await;
        store
    }

    #[tokio::test]
    async fn test_enroll_updates_both_sides() {
        let server = MockServer::start();
        let add = server.mock(|when, then| {
            when.method(POST).path("/batches/b1/students/s2/add");
            then.status(200).json_body(json!({
                "success": true,
                "data": {"_id": "b1", "name": "Algebra A", "capacity": 30}
            }));
        });
        let remove = server.mock(|when, then| {
            when.method(POST).path("/batches/b1/students/s1/remove");
            then.status(200)
                .json_body(json!({"success": true, "message": "Removed"}));
        });

        let mut store = seeded(&server, 30).await;
        let (b1, s1, s2) = (EntityId::new("b1"), EntityId::new("s1"), EntityId::new("s2"));

        let event = store.enroll(b1.clone(), s2.clone()).await;
        add.assert();
        assert_eq!(
            event,
            Event::Enrolled {
                batch: b1.clone(),
                student: s2.clone()
            }
        );
        assert_eq!(enrolled(&store, "b1"), vec!["s1", "s2"]);
        assert!(store.student(&s2).is_some_and(|s| s.in_batch(&b1)));

        store.unenroll(b1.clone(), s1.clone()).await;
        remove.assert();
        assert_eq!(enrolled(&store, "b1"), vec!["s2"]);
        assert!(store.student(&s1).is_some_and(|s| !s.in_batch(&b1)));
    }

    #[tokio::test]
    async fn test_full_batch_rejects_enrollment() {
        let server = MockServer::start();
        let add = server.mock(|when, then| {
            when.method(POST).path("/batches/b1/students/s2/add");
            then.status(200).json_body(json!({"success": true}));
        });

        let mut store = seeded(&server, 1).await;
        let event = store
            .enroll(EntityId::new("b1"), EntityId::new("s2"))
            .await;

        assert_eq!(add.hits(), 0);
        assert_eq!(event, Event::Failed("batch: Batch is full".to_string()));
        assert_eq!(
            store.state().batches.error.as_deref(),
            Some("batch: Batch is full")
        );
    }

    #[tokio::test]
    async fn test_batches_by_subject_leaves_store_alone() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/batches/by-subject")
                .query_param("subjectId", "sub1");
            then.status(200).json_body(json!([{"_id": "b7", "name": "Physics"}]));
        });

        let store = store(&server);
        let batches = store
            .batches_by_subject(&EntityId::new("sub1"))
            .await
            .unwrap();
        assert_eq!(batches.len(), 1);
        assert!(store.state().batches.items().is_empty());
    }

    #[tokio::test]
    async fn test_attendance() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/attendance/batch/b1");
            then.status(200).json_body(json!([{
                "_id": "a1",
                "batch": "b1",
                "date": "2024-06-03",
                "records": [{"student": "s1", "status": "present"}]
            }]));
        });
        server.mock(|when, then| {
            when.method(POST).path("/attendance");
            then.status(201).json_body(json!({"data": {
                "_id": "a2",
                "batch": "b1",
                "date": "2024-06-04",
                "records": [{"student": "s1", "status": "absent"}]
            }}));
        });

        let mut store = store(&server);
        let event = store.load_attendance(EntityId::new("b1"), None).await;
        assert_eq!(event, Event::Loaded { count: 1 });

        let draft = AttendanceDraft {
            batch: EntityId::new("b1"),
            date: NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
            records: vec![AttendanceMark {
                student: EntityId::new("s1"),
                status: AttendanceStatus::Absent,
            }],
        };
        let event = store
            .dispatch::<AttendanceRecord>(Command::Create(draft))
            .await;
        assert_eq!(event, Event::Created(EntityId::new("a2")));
        assert_eq!(store.state().attendance.items().len(), 2);
    }

    #[tokio::test]
    async fn test_upload_note() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/notes/upload");
            then.status(201)
                .json_body(json!({"data": {"_id": "n1", "title": "Vectors"}}));
        });

        let mut store = store(&server);
        let draft = NoteDraft::default()
            .title("Vectors")
            .subject(EntityId::new("sub1"));
        let event = store
            .upload_note(
                NoteUpload::new(draft.clone(), "vectors.pdf", &b"%PDF-1.7 vectors"[..]),
                None,
            )
            .await;
        assert_eq!(event, Event::Uploaded(EntityId::new("n1")));
        assert_eq!(store.state().notes.items().len(), 1);

        let event = store
            .upload_note(NoteUpload::new(draft, "vectors.pdf", vec![0u8; 2048]), None)
            .await;
        assert_eq!(
            event,
            Event::Failed("file: File must be at most 1024 bytes".to_string())
        );
        assert_eq!(store.state().notes.items().len(), 1);
    }
}

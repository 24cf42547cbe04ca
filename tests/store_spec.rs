#[cfg(test)]
mod store_spec {
    use std::sync::Arc;

    use httpmock::prelude::*;
    use serde_json::json;
    use tuition_auth::session::Session;
    use tuition_core::api::Query;
    use tuition_core::app_ctx::AppContext;
    use tuition_core::blueprint::Blueprint;
    use tuition_core::config::{ApiInfo, Config};
    use tuition_core::filter::{BatchFilter, StudentFilter};
    use tuition_core::model::{Batch, BatchStatus, EntityId, Student};
    use tuition_core::store::{Command, Event, Store};

    fn store(server: &MockServer) -> anyhow::Result<Store> {
        let config = Config {
            api: ApiInfo {
                base_url: server.base_url(),
                timeout: Some(5),
            },
            ..Default::default()
        };
        let blueprint = Blueprint::try_from(config)?;
        let session = Arc::new(Session::new(blueprint.session.settings.clone()));
        let app_ctx = AppContext {
            blueprint,
            runtime: tuition::cli::rt::init(),
        };
        Ok(Store::from_context(&app_ctx, session))
    }

    fn enrolled(store: &Store, batch: &str) -> Vec<String> {
        store
            .state()
            .batches
            .get(&EntityId::new(batch))
            .and_then(|batch| batch.enrolled_students.as_ref())
            .map(|students| students.iter().map(|s| s.id().to_string()).collect())
            .unwrap_or_default()
    }

    // a listing without enrollments after a populated one, then an enrollment on top
    #[tokio::test]
    async fn enrollment_survives_bare_listing() -> anyhow::Result<()> {
        let server = MockServer::start();
        let mut populated = server.mock(|when, then| {
            when.method(GET)
                .path("/batches")
                .query_param("populate", "enrolledStudents");
            then.status(200).json_body(json!({"success": true, "data": [
                {"_id": "b1", "name": "Alg A", "status": "active", "capacity": 3,
                 "enrolledStudents": [{"_id": "s1", "name": "Ravi"}, {"_id": "s2", "name": "Meera"}]},
                {"_id": "b2", "name": "Alg B", "status": "upcoming"}
            ]}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/students");
            then.status(200).json_body(json!([
                {"_id": "s1", "name": "Ravi", "batches": ["b1"]},
                {"_id": "s2", "name": "Meera", "batches": ["b1"]},
                {"_id": "s3", "name": "Arjun"}
            ]));
        });
        server.mock(|when, then| {
            when.method(POST).path("/batches/b1/students/s3/add");
            then.status(200).json_body(json!({"success": true, "message": "Student added"}));
        });

        let mut store = store(&server)?;
        let event = store
            .dispatch::<Batch>(Command::FetchAll(Query::new().populate("enrolledStudents")))
            .await;
        assert_eq!(event, Event::Loaded { count: 2 });
        populated.delete();

        server.mock(|when, then| {
            when.method(GET).path("/batches");
            then.status(200).json_body(json!([
                {"_id": "b1", "name": "Alg A", "status": "active", "capacity": 3, "enrolledStudents": ["s1"]},
                {"_id": "b2", "name": "Alg B", "status": "upcoming"}
            ]));
        });
        store.dispatch::<Batch>(Command::FetchAll(Query::new())).await;
        assert_eq!(enrolled(&store, "b1"), vec!["s1", "s2"]);

        store.dispatch::<Student>(Command::FetchAll(Query::new())).await;
        let event = store.enroll(EntityId::new("b1"), EntityId::new("s3")).await;
        assert!(!event.is_failure(), "{:?}", event);
        assert_eq!(enrolled(&store, "b1"), vec!["s1", "s2", "s3"]);

        let in_b1 = StudentFilter::default()
            .batch(EntityId::new("b1"))
            .apply(store.state().students.items())
            .len();
        assert_eq!(in_b1, 3);

        let active = BatchFilter::default()
            .name(" alg ")
            .status(BatchStatus::Active)
            .apply(store.state().batches.items());
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, EntityId::new("b1"));

        // b1 is now at capacity
        let event = store.enroll(EntityId::new("b1"), EntityId::new("s4")).await;
        assert_eq!(event, Event::Failed("batch: Batch is full".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_envelope_is_a_failure() -> anyhow::Result<()> {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(DELETE).path("/batches/b1");
            then.status(200)
                .json_body(json!({"success": false, "message": "Batch has students"}));
        });

        let mut store = store(&server)?;
        let event = store
            .dispatch::<Batch>(Command::Delete(EntityId::new("b1")))
            .await;
        assert_eq!(event, Event::Failed("Batch has students".to_string()));
        assert_eq!(
            store.state().batches.error.as_deref(),
            Some("Batch has students")
        );
        Ok(())
    }
}

use tokio_util::sync::CancellationToken;

use crate::http::envelope;
use crate::http::{ApiClient, ApiError, ApiRequest};
use crate::model::{Batch, EntityId, Resource};

/// What enrollment calls do to the batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Enrollment {
    Add,
    Remove,
}

impl Enrollment {
    fn segment(self) -> &'static str {
        match self {
            Enrollment::Add => "add",
            Enrollment::Remove => "remove",
        }
    }
}

/// Batch calls beyond plain CRUD.
pub struct BatchApi<'a> {
    client: &'a ApiClient,
}

impl<'a> BatchApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn by_subject(
        &self,
        subject: &EntityId,
        cancel: &CancellationToken,
    ) -> Result<Vec<Batch>, ApiError> {
        let req = ApiRequest::get(format!("{}/by-subject", Batch::PATH))
            .query([("subjectId", subject.as_str())])
            .cancel(cancel.clone());
        self.client.fetch(req).await
    }

    /// Returns the updated batch when the API echoes it back.
    pub async fn enrollment(
        &self,
        action: Enrollment,
        batch: &EntityId,
        student: &EntityId,
        cancel: &CancellationToken,
    ) -> Result<Option<Batch>, ApiError> {
        let path = enrollment_path(action, batch, student);
        let response = self
            .client
            .send(ApiRequest::post(path).cancel(cancel.clone()))
            .await?;
        envelope::unwrap_optional(&response.body)
    }
}

fn enrollment_path(action: Enrollment, batch: &EntityId, student: &EntityId) -> String {
    format!(
        "{}/students/{}/{}",
        Batch::item_path(batch),
        student.segment(),
        action.segment()
    )
}

use std::marker::PhantomData;

use tokio_util::sync::CancellationToken;

use crate::api::Query;
use crate::http::{ApiClient, ApiError, ApiRequest};
use crate::model::{EntityId, Resource};
use crate::validation::Validate;

/// CRUD over the collection of `R`. Drafts are validated before anything
/// is sent.
pub struct ResourceApi<'a, R> {
    client: &'a ApiClient,
    _resource: PhantomData<R>,
}

impl<'a, R: Resource> ResourceApi<'a, R> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    pub async fn list(&self, query: &Query, cancel: &CancellationToken) -> Result<Vec<R>, ApiError> {
        let req = ApiRequest::get(R::PATH)
            .query(query.params.iter().cloned())
            .cancel(cancel.clone());
        self.client.fetch(req).await
    }

    /// Returns the entity with its version tag, if the API sent one.
    pub async fn get(
        &self,
        id: &EntityId,
        cancel: &CancellationToken,
    ) -> Result<(R, Option<String>), ApiError> {
        let req = ApiRequest::get(R::item_path(id)).cancel(cancel.clone());
        self.client.fetch_versioned(req).await
    }

    pub async fn create(&self, draft: &R::Draft, cancel: &CancellationToken) -> Result<R, ApiError> {
        draft.validate()?;
        let req = ApiRequest::post(R::PATH).json(draft)?.cancel(cancel.clone());
        self.client.fetch(req).await
    }

    /// With a `version`, the API refuses the update if the entity changed
    /// since that version was read. Returns the entity with its new version.
    pub async fn update(
        &self,
        id: &EntityId,
        draft: &R::Draft,
        version: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<(R, Option<String>), ApiError> {
        draft.validate()?;
        let req = ApiRequest::put(R::item_path(id))
            .json(draft)?
            .if_match(version)
            .cancel(cancel.clone());
        self.client.fetch_versioned(req).await
    }

    pub async fn delete(&self, id: &EntityId, cancel: &CancellationToken) -> Result<(), ApiError> {
        let req = ApiRequest::delete(R::item_path(id)).cancel(cancel.clone());
        self.client.execute(req).await
    }
}

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use crate::http::{ApiClient, ApiError, ApiRequest};
use crate::model::{AttendanceRecord, EntityId, Resource};

pub struct AttendanceApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AttendanceApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Attendance of `batch`, optionally narrowed to a single day.
    pub async fn for_batch(
        &self,
        batch: &EntityId,
        date: Option<NaiveDate>,
        cancel: &CancellationToken,
    ) -> Result<Vec<AttendanceRecord>, ApiError> {
        let mut req = ApiRequest::get(format!("{}/batch/{}", AttendanceRecord::PATH, batch))
            .cancel(cancel.clone());
        if let Some(date) = date {
            req = req.query([("date", date.format("%Y-%m-%d").to_string())]);
        }
        self.client.fetch(req).await
    }
}

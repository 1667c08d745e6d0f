/// Record service contract
///
/// This module defines the seam between the gateway and the hosted record
/// service. Implementations translate the five record operations onto a
/// concrete transport and report only transport-level failures as errors:
/// an envelope with `success: false` is a successful call as far as this
/// trait is concerned, and the gateway decides what it means.
///
/// # Implementations
///
/// - `HttpRecordService`: JSON over HTTP against the hosted service
/// - `InMemoryRecordService`: process-local store for tests and development
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_shared::upstream::{FetchParams, InMemoryRecordService, RecordService};
///
/// # async fn example() -> taskboard_shared::error::GatewayResult<()> {
/// let service: Arc<dyn RecordService> = Arc::new(InMemoryRecordService::new());
/// let response = service
///     .fetch_records("task_c", &FetchParams::select(&["Name", "status_c"]))
///     .await?;
/// println!("{} tasks", response.data.len());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;

use super::protocol::{
    DeleteParams, DeleteResponse, FetchParams, FetchResponse, GetParams, GetResponse,
    MutationResponse, RecordsParams,
};
use crate::error::GatewayResult;

/// Async record service
///
/// All methods take the collection name (`task_c`, `user_c`, ...) and the
/// parameter shape of the matching upstream call.
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Returns the service name
    ///
    /// Used for logging and health reporting.
    fn name(&self) -> &str;

    /// Lists records matching the query
    async fn fetch_records(&self, collection: &str, params: &FetchParams) -> GatewayResult<FetchResponse>;

    /// Fetches a single record by id
    async fn get_record_by_id(
        &self,
        collection: &str,
        id: i64,
        params: &GetParams,
    ) -> GatewayResult<GetResponse>;

    /// Creates records
    async fn create_record(&self, collection: &str, params: &RecordsParams) -> GatewayResult<MutationResponse>;

    /// Updates records (partial: only the keys present are written)
    async fn update_record(&self, collection: &str, params: &RecordsParams) -> GatewayResult<MutationResponse>;

    /// Deletes records by id
    async fn delete_record(&self, collection: &str, params: &DeleteParams) -> GatewayResult<DeleteResponse>;
}

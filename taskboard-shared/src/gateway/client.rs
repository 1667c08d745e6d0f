/// Envelope handling shared by every adapter
///
/// `RecordClient` owns the `RecordService` handle and the per-call deadline,
/// and turns the service's `{ success, message, data | results }` envelopes
/// into typed values or `GatewayError`s:
///
/// - lists: failures are logged and swallowed (empty list); undecodable
///   records are skipped
/// - single fetch: `success: false` becomes `NotFound`
/// - create/update: outer failure, per-record failure and empty `results`
///   all become `OperationFailed`
/// - delete: outer failure becomes `OperationFailed`
///
/// Every call runs under `CallTimeout`.

use std::sync::Arc;

use crate::error::{GatewayError, GatewayResult};
use crate::models::Entity;
use crate::timeout::CallTimeout;
use crate::upstream::{
    DeleteParams, FetchParams, FieldSpec, GetParams, MutationResponse, Record, RecordService,
    RecordsParams,
};

/// Message used when a mutation succeeds without returning a record
pub const NO_RESULT: &str = "no result";

/// Typed access to the record service
#[derive(Clone)]
pub struct RecordClient {
    service: Arc<dyn RecordService>,
    timeout: CallTimeout,
}

impl RecordClient {
    pub fn new(service: Arc<dyn RecordService>, timeout: CallTimeout) -> Self {
        RecordClient { service, timeout }
    }

    /// Name of the underlying service implementation
    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    /// Fetches and decodes a list, propagating failures
    pub async fn try_list<E: Entity>(&self, params: &FetchParams) -> GatewayResult<Vec<E>> {
        let response = self
            .timeout
            .run(
                "fetch_records",
                self.service.fetch_records(E::COLLECTION, params),
            )
            .await?;

        if !response.success {
            return Err(GatewayError::Upstream(
                response
                    .message
                    .unwrap_or_else(|| format!("Failed to fetch {} records", E::LABEL.to_lowercase())),
            ));
        }

        Ok(response
            .data
            .iter()
            .filter_map(|record| match E::from_record(record) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    tracing::warn!(collection = E::COLLECTION, error = %e, "Skipping undecodable record");
                    None
                }
            })
            .collect())
    }

    /// Fetches and decodes a list; any failure yields an empty list
    pub async fn list<E: Entity>(&self, operation: &str, params: FetchParams) -> Vec<E> {
        match self.try_list::<E>(&params).await {
            Ok(entities) => {
                tracing::debug!(
                    collection = E::COLLECTION,
                    operation = operation,
                    count = entities.len(),
                    "Fetched records"
                );
                entities
            }
            Err(e) => {
                tracing::warn!(
                    collection = E::COLLECTION,
                    operation = operation,
                    error = %e,
                    "List failed, returning empty result"
                );
                Vec::new()
            }
        }
    }

    /// Fetches the raw record for `id`
    pub async fn get_record<E: Entity>(&self, id: i64) -> GatewayResult<Record> {
        let params = GetParams {
            fields: FieldSpec::list(E::FIELDS),
        };

        let result = self
            .timeout
            .run(
                "get_record_by_id",
                self.service.get_record_by_id(E::COLLECTION, id, &params),
            )
            .await
            .and_then(|response| match (response.success, response.data) {
                (true, Some(record)) => Ok(record),
                (_, _) => Err(GatewayError::NotFound(
                    response
                        .message
                        .unwrap_or_else(|| format!("{} not found", E::LABEL)),
                )),
            });

        if let Err(e) = &result {
            tracing::error!(collection = E::COLLECTION, id = id, error = %e, "Failed to fetch record");
        }
        result
    }

    /// Fetches and decodes the record for `id`
    pub async fn get<E: Entity>(&self, id: i64) -> GatewayResult<E> {
        let record = self.get_record::<E>(id).await?;
        E::from_record(&record)
    }

    /// Creates one record and decodes the stored result
    pub async fn create<E: Entity>(&self, record: Record) -> GatewayResult<E> {
        let params = RecordsParams::single(record);
        let result = self
            .timeout
            .run("create_record", self.service.create_record(E::COLLECTION, &params))
            .await
            .and_then(|response| unwrap_mutation::<E>(response, "create"));

        log_mutation::<E>("create", &result);
        result
    }

    /// Updates one record (its `Id` is inside `record`) and decodes the result
    pub async fn update<E: Entity>(&self, record: Record) -> GatewayResult<E> {
        let params = RecordsParams::single(record);
        let result = self
            .timeout
            .run("update_record", self.service.update_record(E::COLLECTION, &params))
            .await
            .and_then(|response| unwrap_mutation::<E>(response, "update"));

        log_mutation::<E>("update", &result);
        result
    }

    /// Deletes the record with `id`
    pub async fn delete<E: Entity>(&self, id: i64) -> GatewayResult<()> {
        let params = DeleteParams::single(id);
        let result = self
            .timeout
            .run("delete_record", self.service.delete_record(E::COLLECTION, &params))
            .await
            .and_then(|response| {
                if response.success {
                    Ok(())
                } else {
                    Err(GatewayError::OperationFailed(response.message.unwrap_or_else(|| {
                        format!("Failed to delete {}", E::LABEL.to_lowercase())
                    })))
                }
            });

        match &result {
            Ok(()) => tracing::info!(collection = E::COLLECTION, id = id, "Deleted record"),
            Err(e) => tracing::error!(collection = E::COLLECTION, id = id, error = %e, "Failed to delete record"),
        }
        result
    }
}

/// Unwraps the two-level mutation envelope
fn unwrap_mutation<E: Entity>(response: MutationResponse, verb: &str) -> GatewayResult<E> {
    let fallback = || format!("Failed to {} {}", verb, E::LABEL.to_lowercase());

    if !response.success {
        return Err(GatewayError::OperationFailed(
            response.message.unwrap_or_else(fallback),
        ));
    }

    let outer_message = response.message;
    let result = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::OperationFailed(NO_RESULT.to_string()))?;

    if !result.success {
        return Err(GatewayError::OperationFailed(
            result.message.or(outer_message).unwrap_or_else(fallback),
        ));
    }

    match result.data {
        Some(record) => E::from_record(&record),
        None => Err(GatewayError::OperationFailed(NO_RESULT.to_string())),
    }
}

fn log_mutation<E: Entity>(verb: &str, result: &GatewayResult<E>) {
    match result {
        Ok(_) => tracing::info!(collection = E::COLLECTION, operation = verb, "Record mutation succeeded"),
        Err(e) => tracing::error!(
            collection = E::COLLECTION,
            operation = verb,
            kind = e.kind(),
            error = %e,
            "Record mutation failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Comment;
    use crate::upstream::MutationResult;
    use serde_json::json;

    fn data(value: serde_json::Value) -> Option<Record> {
        value.as_object().cloned()
    }

    #[test]
    fn test_unwrap_outer_failure() {
        let response = MutationResponse {
            success: false,
            message: Some("quota exceeded".to_string()),
            results: Vec::new(),
        };
        assert_eq!(
            unwrap_mutation::<Comment>(response, "create").unwrap_err(),
            GatewayError::OperationFailed("quota exceeded".to_string())
        );
    }

    #[test]
    fn test_unwrap_record_failure_message_precedence() {
        let response = MutationResponse {
            success: true,
            message: Some("outer".to_string()),
            results: vec![MutationResult {
                success: false,
                message: None,
                data: None,
            }],
        };
        assert_eq!(
            unwrap_mutation::<Comment>(response, "update").unwrap_err(),
            GatewayError::OperationFailed("outer".to_string())
        );

        let response = MutationResponse {
            success: true,
            message: None,
            results: vec![MutationResult::default()],
        };
        assert_eq!(
            unwrap_mutation::<Comment>(response, "update").unwrap_err(),
            GatewayError::OperationFailed("Failed to update comment".to_string())
        );
    }

    #[test]
    fn test_unwrap_empty_results_is_no_result() {
        let response = MutationResponse {
            success: true,
            message: None,
            results: Vec::new(),
        };
        assert_eq!(
            unwrap_mutation::<Comment>(response, "create").unwrap_err(),
            GatewayError::OperationFailed(NO_RESULT.to_string())
        );
    }

    #[test]
    fn test_unwrap_success() {
        let response = MutationResponse {
            success: true,
            message: None,
            results: vec![MutationResult {
                success: true,
                message: None,
                data: data(json!({ "Id": 4, "content_c": "hi", "task_id_c": 1 })),
            }],
        };
        let comment = unwrap_mutation::<Comment>(response, "create").unwrap();
        assert_eq!(comment.id, 4);
        assert_eq!(comment.content, "hi");
    }
}

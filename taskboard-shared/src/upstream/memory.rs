/// In-memory record service for testing and local development
///
/// This implementation keeps every collection in process memory and answers
/// with the same envelopes as the hosted service. It's useful for:
/// - Testing the gateway without network access
/// - Running the API locally (`UPSTREAM_MODE=memory`)
/// - Reproducing upstream failure modes deterministically
///
/// # Behavior
///
/// - Ids are assigned from a single counter shared by all collections
/// - Created records are stamped with `CreatedOn` (RFC 3339)
/// - `fetch` applies all where clauses (AND), then ordering, then paging,
///   and returns `Id`, `CreatedOn` and the selected fields
/// - `update` merges the given keys into the stored record
///
/// # Fault Injection
///
/// Faults are queued per operation and consumed in order by the next calls
/// of that operation:
///
/// ```no_run
/// use taskboard_shared::upstream::{Fault, InMemoryRecordService, Operation};
///
/// let service = InMemoryRecordService::new();
/// service.inject(Operation::Create, Fault::EmptyResults);
/// ```

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;

use super::protocol::{
    DeleteParams, DeleteResponse, FetchParams, FetchResponse, GetParams, GetResponse,
    MutationResponse, MutationResult, OrderBy, Record, RecordsParams, SortType, ID_FIELD,
};
use super::service::RecordService;
use crate::error::{GatewayError, GatewayResult};

/// Platform-maintained creation timestamp
pub const CREATED_ON_FIELD: &str = "CreatedOn";

/// Record service operation, used to target injected faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Fetch,
    Get,
    Create,
    Update,
    Delete,
}

/// Injected behavior for one call
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// Serve the call normally
    Pass,

    /// Fail the call at the transport level
    Transport(String),

    /// Envelope with outer `success: false`
    Reject(Option<String>),

    /// Outer success, first per-record entry `success: false` (mutations only)
    RejectRecord(Option<String>),

    /// Outer success with an empty `results` list (mutations only)
    EmptyResults,

    /// Never answer within any reasonable deadline
    Stall,

    /// Merge these fields into the targeted record, then serve normally
    ///
    /// Simulates another client writing between two of our calls. Applies to
    /// `Get` and `Update`, whose target id is known.
    ConcurrentWrite(Record),
}

#[derive(Default)]
struct StoreState {
    collections: HashMap<String, BTreeMap<i64, Record>>,
    next_id: i64,
    faults: HashMap<Operation, VecDeque<Fault>>,
    calls: HashMap<Operation, usize>,
}

/// In-memory `RecordService`
pub struct InMemoryRecordService {
    state: Mutex<StoreState>,
}

impl InMemoryRecordService {
    /// Creates an empty store
    pub fn new() -> Self {
        InMemoryRecordService {
            state: Mutex::new(StoreState {
                next_id: 1,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queues a fault for the next unfaulted call of `operation`
    pub fn inject(&self, operation: Operation, fault: Fault) {
        self.lock().faults.entry(operation).or_default().push_back(fault);
    }

    /// Inserts a record directly, bypassing faults; returns its id
    ///
    /// An `Id` already present in `record` is kept.
    pub fn insert(&self, collection: &str, mut record: Record) -> i64 {
        let mut state = self.lock();
        let id = match record.get(ID_FIELD).and_then(JsonValue::as_i64) {
            Some(id) => {
                state.next_id = state.next_id.max(id + 1);
                id
            }
            None => {
                let id = state.next_id;
                state.next_id += 1;
                id
            }
        };

        record.insert(ID_FIELD.to_string(), JsonValue::from(id));
        record
            .entry(CREATED_ON_FIELD.to_string())
            .or_insert_with(|| JsonValue::from(Utc::now().to_rfc3339()));

        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, record);
        id
    }

    /// Returns a stored record by id
    pub fn record(&self, collection: &str, id: i64) -> Option<Record> {
        self.lock()
            .collections
            .get(collection)
            .and_then(|records| records.get(&id))
            .cloned()
    }

    /// Returns every stored record of a collection, ordered by id
    pub fn records(&self, collection: &str) -> Vec<Record> {
        self.lock()
            .collections
            .get(collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of calls made for `operation` so far
    pub fn call_count(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    /// Counts the call and pops the next queued fault, if any
    async fn begin(&self, operation: Operation, collection: &str) -> GatewayResult<Fault> {
        let fault = {
            let mut state = self.lock();
            *state.calls.entry(operation).or_default() += 1;
            tracing::trace!(operation = ?operation, collection = collection, "In-memory record call");
            state
                .faults
                .get_mut(&operation)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Fault::Pass)
        };

        match fault {
            Fault::Transport(message) => Err(GatewayError::Upstream(message)),
            Fault::Stall => {
                tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
                Err(GatewayError::Upstream("stalled call resumed".to_string()))
            }
            other => Ok(other),
        }
    }

    fn apply_concurrent_write(&self, collection: &str, id: i64, fault: &Fault) {
        if let Fault::ConcurrentWrite(patch) = fault {
            let mut state = self.lock();
            if let Some(stored) = state
                .collections
                .get_mut(collection)
                .and_then(|records| records.get_mut(&id))
            {
                for (key, value) in patch {
                    stored.insert(key.clone(), value.clone());
                }
            }
        }
    }

    fn mutation_fault(fault: &Fault) -> Option<MutationResponse> {
        match fault {
            Fault::Reject(message) => Some(MutationResponse {
                success: false,
                message: message.clone(),
                results: Vec::new(),
            }),
            Fault::RejectRecord(message) => Some(MutationResponse {
                success: true,
                message: None,
                results: vec![MutationResult {
                    success: false,
                    message: message.clone(),
                    data: None,
                }],
            }),
            Fault::EmptyResults => Some(MutationResponse {
                success: true,
                message: None,
                results: Vec::new(),
            }),
            _ => None,
        }
    }
}

impl Default for InMemoryRecordService {
    fn default() -> Self {
        Self::new()
    }
}

fn project(record: &Record, fields: &[String]) -> Record {
    if fields.is_empty() {
        return record.clone();
    }

    record
        .iter()
        .filter(|(key, _)| {
            key.as_str() == ID_FIELD || key.as_str() == CREATED_ON_FIELD || fields.contains(key)
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn compare_field(a: &Record, b: &Record, order: &OrderBy) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    let ordering = match (a.get(&order.field_name), b.get(&order.field_name)) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        _ => Ordering::Equal,
    };

    match order.sorttype {
        SortType::Asc => ordering,
        SortType::Desc => ordering.reverse(),
    }
}

fn record_id(record: &Record) -> Option<i64> {
    record.get(ID_FIELD).and_then(JsonValue::as_i64)
}

#[async_trait]
impl RecordService for InMemoryRecordService {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_records(&self, collection: &str, params: &FetchParams) -> GatewayResult<FetchResponse> {
        if let Fault::Reject(message) = self.begin(Operation::Fetch, collection).await? {
            return Ok(FetchResponse {
                success: false,
                message,
                data: Vec::new(),
            });
        }

        let fields: Vec<String> = params.fields.iter().map(|f| f.field.name.clone()).collect();
        let mut matched: Vec<Record> = self
            .records(collection)
            .into_iter()
            .filter(|record| params.where_clauses.iter().all(|clause| clause.matches(record)))
            .collect();

        for order in params.order_by.iter().rev() {
            matched.sort_by(|a, b| compare_field(a, b, order));
        }

        let matched = match params.paging_info {
            Some(paging) => matched
                .into_iter()
                .skip(paging.offset as usize)
                .take(paging.limit as usize)
                .collect(),
            None => matched,
        };

        Ok(FetchResponse {
            success: true,
            message: None,
            data: matched.iter().map(|record| project(record, &fields)).collect(),
        })
    }

    async fn get_record_by_id(
        &self,
        collection: &str,
        id: i64,
        params: &GetParams,
    ) -> GatewayResult<GetResponse> {
        let fault = self.begin(Operation::Get, collection).await?;
        if let Fault::Reject(message) = fault {
            return Ok(GetResponse {
                success: false,
                message,
                data: None,
            });
        }
        self.apply_concurrent_write(collection, id, &fault);

        let fields: Vec<String> = params.fields.iter().map(|f| f.field.name.clone()).collect();
        Ok(match self.record(collection, id) {
            Some(record) => GetResponse {
                success: true,
                message: None,
                data: Some(project(&record, &fields)),
            },
            None => GetResponse {
                success: false,
                message: Some(format!("Record with Id {} does not exist", id)),
                data: None,
            },
        })
    }

    async fn create_record(&self, collection: &str, params: &RecordsParams) -> GatewayResult<MutationResponse> {
        let fault = self.begin(Operation::Create, collection).await?;
        if let Some(response) = Self::mutation_fault(&fault) {
            return Ok(response);
        }

        let results = params
            .records
            .iter()
            .map(|record| {
                let mut record = record.clone();
                record.remove(ID_FIELD);
                let id = self.insert(collection, record);
                MutationResult {
                    success: true,
                    message: None,
                    data: self.record(collection, id),
                }
            })
            .collect();

        Ok(MutationResponse {
            success: true,
            message: None,
            results,
        })
    }

    async fn update_record(&self, collection: &str, params: &RecordsParams) -> GatewayResult<MutationResponse> {
        let fault = self.begin(Operation::Update, collection).await?;
        if let Some(response) = Self::mutation_fault(&fault) {
            return Ok(response);
        }

        let mut results = Vec::with_capacity(params.records.len());
        for patch in &params.records {
            let Some(id) = record_id(patch) else {
                results.push(MutationResult {
                    success: false,
                    message: Some("Id is required for update".to_string()),
                    data: None,
                });
                continue;
            };

            self.apply_concurrent_write(collection, id, &fault);

            let updated = {
                let mut state = self.lock();
                state
                    .collections
                    .get_mut(collection)
                    .and_then(|records| records.get_mut(&id))
                    .map(|stored| {
                        for (key, value) in patch {
                            stored.insert(key.clone(), value.clone());
                        }
                        stored.clone()
                    })
            };

            results.push(match updated {
                Some(record) => MutationResult {
                    success: true,
                    message: None,
                    data: Some(record),
                },
                None => MutationResult {
                    success: false,
                    message: Some(format!("Record with Id {} does not exist", id)),
                    data: None,
                },
            });
        }

        Ok(MutationResponse {
            success: true,
            message: None,
            results,
        })
    }

    async fn delete_record(&self, collection: &str, params: &DeleteParams) -> GatewayResult<DeleteResponse> {
        if let Fault::Reject(message) = self.begin(Operation::Delete, collection).await? {
            return Ok(DeleteResponse {
                success: false,
                message,
            });
        }

        let mut state = self.lock();
        let records = state.collections.entry(collection.to_string()).or_default();
        let missing: Vec<String> = params
            .record_ids
            .iter()
            .filter(|id| records.remove(*id).is_none())
            .map(|id| id.to_string())
            .collect();

        if missing.is_empty() {
            Ok(DeleteResponse {
                success: true,
                message: None,
            })
        } else {
            Ok(DeleteResponse {
                success: false,
                message: Some(format!("Records not found: {}", missing.join(", "))),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: JsonValue) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_stamp() {
        let service = InMemoryRecordService::new();
        let response = service
            .create_record("task_c", &RecordsParams::single(record(json!({ "title_c": "Write docs" }))))
            .await
            .unwrap();

        assert!(response.success);
        let data = response.results[0].data.clone().unwrap();
        assert_eq!(data["Id"], 1);
        assert!(data.contains_key(CREATED_ON_FIELD));
        assert_eq!(service.records("task_c").len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_filters_orders_and_pages() {
        let service = InMemoryRecordService::new();
        for (status, ts) in [("todo", "2024-01-01"), ("done", "2024-01-03"), ("done", "2024-01-02")] {
            service.insert("task_c", record(json!({ "status_c": status, "timestamp_c": ts })));
        }

        let params = FetchParams::select(&["status_c", "timestamp_c"])
            .filter_eq("status_c", "done")
            .order(OrderBy::descending("timestamp_c"))
            .page(1, 0);
        let response = service.fetch_records("task_c", &params).await.unwrap();

        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0]["timestamp_c"], "2024-01-03");
    }

    #[tokio::test]
    async fn test_fetch_projects_selected_fields() {
        let service = InMemoryRecordService::new();
        service.insert("user_c", record(json!({ "name_c": "Ada", "email_c": "ada@example.com" })));

        let response = service
            .fetch_records("user_c", &FetchParams::select(&["name_c"]))
            .await
            .unwrap();

        let user = &response.data[0];
        assert!(user.contains_key("Id"));
        assert!(user.contains_key("name_c"));
        assert!(!user.contains_key("email_c"));
    }

    #[tokio::test]
    async fn test_injected_faults_are_consumed_in_order() {
        let service = InMemoryRecordService::new();
        service.inject(Operation::Create, Fault::EmptyResults);
        service.inject(Operation::Create, Fault::Transport("connection reset".to_string()));

        let params = RecordsParams::single(record(json!({ "title_c": "x" })));

        let first = service.create_record("task_c", &params).await.unwrap();
        assert!(first.success && first.results.is_empty());

        let second = service.create_record("task_c", &params).await;
        assert_eq!(second, Err(GatewayError::Upstream("connection reset".to_string())));

        let third = service.create_record("task_c", &params).await.unwrap();
        assert_eq!(third.results.len(), 1);
        assert_eq!(service.call_count(Operation::Create), 3);
        assert_eq!(service.call_count(Operation::Fetch), 0);
    }

    #[tokio::test]
    async fn test_get_missing_record_reports_failure() {
        let service = InMemoryRecordService::new();
        let response = service
            .get_record_by_id("project_c", 99, &GetParams::default())
            .await
            .unwrap();

        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("Record with Id 99 does not exist"));
    }

    #[tokio::test]
    async fn test_delete_missing_record_reports_failure() {
        let service = InMemoryRecordService::new();
        let response = service
            .delete_record("comment_c", &DeleteParams::single(5))
            .await
            .unwrap();

        assert!(!response.success);
    }

    #[tokio::test]
    async fn test_concurrent_write_applies_before_get() {
        let service = InMemoryRecordService::new();
        let id = service.insert("project_c", record(json!({ "team_members_c": "1" })));
        service.inject(
            Operation::Get,
            Fault::ConcurrentWrite(record(json!({ "team_members_c": "1,2" }))),
        );

        let response = service
            .get_record_by_id("project_c", id, &GetParams::default())
            .await
            .unwrap();
        assert_eq!(response.data.unwrap()["team_members_c"], "1,2");
    }
}

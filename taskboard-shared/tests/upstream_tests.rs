/// Integration tests for the record service transports
///
/// The HTTP tests run `HttpRecordService` against a local axum stub that
/// fails, garbles its body, or echoes the request back. The list decoding
/// test uses a fixed-answer `RecordService`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value as JsonValue};
use taskboard_shared::error::{GatewayError, GatewayResult};
use taskboard_shared::gateway::RecordClient;
use taskboard_shared::models::Comment;
use taskboard_shared::timeout::CallTimeout;
use taskboard_shared::upstream::http::{PROJECT_ID_HEADER, PUBLIC_KEY_HEADER};
use taskboard_shared::upstream::{
    DeleteParams, DeleteResponse, FetchParams, FetchResponse, GetParams, GetResponse,
    HttpRecordService, MutationResponse, Record, RecordService, RecordsParams, UpstreamConfig,
};

async fn echo(
    Path((collection, operation)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<JsonValue>,
) -> Json<JsonValue> {
    let header = |name: &str| -> String {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };

    Json(json!({
        "success": true,
        "data": [{
            "Id": 1,
            "collection": collection,
            "operation": operation,
            "project_id": header(PROJECT_ID_HEADER),
            "public_key": header(PUBLIC_KEY_HEADER),
            "body": body
        }]
    }))
}

/// Starts the stub on an ephemeral port and returns its base URL
async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/echo/records/:collection/:operation", post(echo))
        .route(
            "/broken/records/:collection/:operation",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database is on fire") }),
        )
        .route(
            "/garbled/records/:collection/:operation",
            post(|| async { "<html>not json</html>" }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", address)
}

fn http_service(base_url: String) -> HttpRecordService {
    HttpRecordService::new(UpstreamConfig {
        base_url,
        project_id: "proj-42".to_string(),
        public_key: "pk-test".to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_http_sends_credentials_and_body() {
    let base = spawn_stub().await;
    let service = http_service(format!("{}/echo", base));

    let response = service
        .fetch_records("task_c", &FetchParams::select(&["Name", "status_c"]))
        .await
        .unwrap();

    assert!(response.success);
    let echoed = &response.data[0];
    assert_eq!(echoed["collection"], "task_c");
    assert_eq!(echoed["operation"], "fetch");
    assert_eq!(echoed["project_id"], "proj-42");
    assert_eq!(echoed["public_key"], "pk-test");
    assert!(echoed["body"]["fields"].is_array());

    let response = service
        .get_record_by_id("task_c", 42, &GetParams::default())
        .await
        .unwrap();
    let echoed = response.data.unwrap();
    assert_eq!(echoed["operation"], "42");
    assert_eq!(echoed["public_key"], "pk-test");
}

#[tokio::test]
async fn test_http_error_status_is_upstream() {
    let base = spawn_stub().await;
    let service = http_service(format!("{}/broken", base));

    let err = service
        .fetch_records("task_c", &FetchParams::default())
        .await
        .unwrap_err();

    match err {
        GatewayError::Upstream(message) => {
            assert!(message.contains("500"), "unexpected message: {}", message);
            assert!(message.contains("database is on fire"));
        }
        other => panic!("expected Upstream, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_undecodable_body_is_upstream() {
    let base = spawn_stub().await;
    let service = http_service(format!("{}/garbled", base));

    let err = service
        .delete_record("task_c", &DeleteParams::single(3))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Upstream(message) if message.starts_with("Malformed upstream payload")));
}

#[tokio::test]
async fn test_http_connection_refused_is_upstream() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let service = http_service(format!("http://{}", address));
    let err = service
        .fetch_records("task_c", &FetchParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Upstream(_)));
}

/// Answers every fetch with the same records
struct FixedRecords(Vec<Record>);

#[async_trait]
impl RecordService for FixedRecords {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn fetch_records(&self, _collection: &str, _params: &FetchParams) -> GatewayResult<FetchResponse> {
        Ok(FetchResponse {
            success: true,
            message: None,
            data: self.0.clone(),
        })
    }

    async fn get_record_by_id(
        &self,
        _collection: &str,
        _id: i64,
        _params: &GetParams,
    ) -> GatewayResult<GetResponse> {
        Err(GatewayError::Upstream("unsupported".to_string()))
    }

    async fn create_record(&self, _collection: &str, _params: &RecordsParams) -> GatewayResult<MutationResponse> {
        Err(GatewayError::Upstream("unsupported".to_string()))
    }

    async fn update_record(&self, _collection: &str, _params: &RecordsParams) -> GatewayResult<MutationResponse> {
        Err(GatewayError::Upstream("unsupported".to_string()))
    }

    async fn delete_record(&self, _collection: &str, _params: &DeleteParams) -> GatewayResult<DeleteResponse> {
        Err(GatewayError::Upstream("unsupported".to_string()))
    }
}

fn record(value: JsonValue) -> Record {
    value.as_object().cloned().expect("test record must be an object")
}

#[tokio::test]
async fn test_list_skips_records_without_id() {
    let service = FixedRecords(vec![
        record(json!({ "Id": 4, "content_c": "first", "task_id_c": 1 })),
        record(json!({ "content_c": "orphan", "task_id_c": 1 })),
        record(json!({ "Id": "not-a-number", "content_c": "garbled", "task_id_c": 1 })),
        record(json!({ "Id": "6", "content_c": "second", "task_id_c": 1 })),
    ]);
    let client = RecordClient::new(Arc::new(service), CallTimeout::default());

    let comments = client
        .try_list::<Comment>(&FetchParams::default())
        .await
        .unwrap();

    let ids: Vec<i64> = comments.iter().map(|comment| comment.id).collect();
    assert_eq!(ids, vec![4, 6]);
    assert_eq!(comments[1].content, "second");
}

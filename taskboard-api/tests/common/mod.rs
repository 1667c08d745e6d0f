/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An app over the in-memory record service
/// - Session login through the widget callback
/// - Record seeding
/// - A JSON request helper

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::gateway::Gateway;
use taskboard_shared::timeout::CallTimeout;
use taskboard_shared::upstream::{InMemoryRecordService, Record};
use tower::Service as _;

/// Test context containing all necessary resources
pub struct TestContext {
    pub service: Arc<InMemoryRecordService>,
    pub state: AppState,
    pub app: axum::Router,
}

impl TestContext {
    /// Creates a new test context over an empty in-memory store
    pub fn new() -> Self {
        let service = Arc::new(InMemoryRecordService::new());
        let gateway = Gateway::new(service.clone(), CallTimeout::default());
        let state = AppState::new(gateway, Config::in_memory());
        let app = build_router(state.clone());

        TestContext {
            service,
            state,
            app,
        }
    }

    /// Opens a session for `payload` and returns its bearer token
    pub async fn login(&self, payload: JsonValue) -> String {
        let (status, body) = self
            .send(Method::POST, "/v1/session", None, Some(json!({ "user": payload })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "login failed: {}", body);

        body["token"]
            .as_str()
            .expect("authenticated session must carry a token")
            .to_string()
    }

    /// Seeds a user record and opens a session for it
    pub async fn login_as(&self, name: &str, role: &str) -> (i64, String) {
        let id = self.seed(
            "user_c",
            json!({ "Name": name, "name_c": name, "email_c": format!("{}@example.com", name.to_lowercase()), "role_c": role }),
        );
        let token = self
            .login(json!({ "Id": id, "firstName": name, "role": role }))
            .await;
        (id, token)
    }

    /// Inserts a record directly into the store
    pub fn seed(&self, collection: &str, value: JsonValue) -> i64 {
        self.service.insert(collection, record(value))
    }

    /// Sends a JSON request and returns the status and parsed body
    ///
    /// Empty bodies parse as `null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                JsonValue::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }
}

/// Converts a JSON object into a record
pub fn record(value: JsonValue) -> Record {
    value
        .as_object()
        .cloned()
        .expect("test record must be an object")
}

/// Integration tests for the record gateway
///
/// These tests drive the adapters against `InMemoryRecordService`, using
/// fault injection for envelope failures, transport errors and stalls.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value as JsonValue};
use taskboard_shared::error::GatewayError;
use taskboard_shared::fields::FieldBag;
use taskboard_shared::gateway::{Gateway, NO_RESULT};
use taskboard_shared::models::{ProjectStatus, TaskPriority, TaskStatus, UserRole};
use taskboard_shared::timeout::CallTimeout;
use taskboard_shared::upstream::{Fault, InMemoryRecordService, Operation, Record};

fn setup() -> (Arc<InMemoryRecordService>, Gateway) {
    let service = Arc::new(InMemoryRecordService::new());
    let gateway = Gateway::new(service.clone(), CallTimeout::default());
    (service, gateway)
}

fn bag(value: JsonValue) -> FieldBag {
    FieldBag::from_value(value).expect("test bag must be an object")
}

fn record(value: JsonValue) -> Record {
    value.as_object().cloned().expect("test record must be an object")
}

fn seed_project(service: &InMemoryRecordService, members: &str) -> i64 {
    service.insert(
        "project_c",
        record(json!({ "Name": "Apollo", "title_c": "Apollo", "status_c": "active", "team_members_c": members })),
    )
}

#[tokio::test]
async fn test_create_with_empty_results_fails() {
    let (service, gateway) = setup();
    service.inject(Operation::Create, Fault::EmptyResults);

    let err = gateway
        .projects
        .create(&bag(json!({ "title": "Apollo" })))
        .await
        .unwrap_err();

    assert_eq!(err, GatewayError::OperationFailed(NO_RESULT.to_string()));
}

#[tokio::test]
async fn test_update_with_empty_results_fails() {
    let (service, gateway) = setup();
    let id = seed_project(&service, "");
    service.inject(Operation::Update, Fault::EmptyResults);

    let err = gateway
        .projects
        .update(id, &bag(json!({ "status": "completed" })))
        .await
        .unwrap_err();

    assert_eq!(err, GatewayError::OperationFailed("no result".to_string()));
}

#[tokio::test]
async fn test_storage_key_wins_on_create() {
    let (service, gateway) = setup();

    let project = gateway
        .projects
        .create(&bag(json!({ "title": "friendly", "title_c": "storage" })))
        .await
        .unwrap();

    assert_eq!(project.title, "storage");
    let stored = service.record("project_c", project.id).unwrap();
    assert_eq!(stored["Name"], json!("storage"));
    assert_eq!(stored["status_c"], json!("planning"));
}

#[tokio::test]
async fn test_add_team_member_is_idempotent() {
    let (service, gateway) = setup();
    let id = seed_project(&service, "1,2");

    let once = gateway.projects.add_team_member(id, 5).await.unwrap();
    let twice = gateway.projects.add_team_member(id, 5).await.unwrap();

    assert_eq!(once.team_members, twice.team_members);
    assert_eq!(twice.team_members.ids(), &[1, 2, 5]);
    assert_eq!(service.call_count(Operation::Update), 1);
    assert_eq!(service.record("project_c", id).unwrap()["team_members_c"], json!("1,2,5"));
}

#[tokio::test]
async fn test_remove_non_member_is_noop() {
    let (service, gateway) = setup();
    let id = seed_project(&service, "1,2");

    let project = gateway.projects.remove_team_member(id, 9).await.unwrap();

    assert_eq!(project.team_members.ids(), &[1, 2]);
    assert_eq!(service.call_count(Operation::Update), 0);
}

#[tokio::test]
async fn test_remove_team_member() {
    let (service, gateway) = setup();
    let id = seed_project(&service, "1,2,3");

    let project = gateway.projects.remove_team_member(id, 2).await.unwrap();

    assert_eq!(project.team_members.ids(), &[1, 3]);
    assert_eq!(service.record("project_c", id).unwrap()["team_members_c"], json!("1,3"));
}

#[tokio::test]
async fn test_concurrent_team_change_is_conflict() {
    let (service, gateway) = setup();
    let id = seed_project(&service, "1");

    // First read is the snapshot; the verification read sees another writer's change.
    service.inject(Operation::Get, Fault::Pass);
    service.inject(
        Operation::Get,
        Fault::ConcurrentWrite(record(json!({ "team_members_c": "1,4" }))),
    );

    let err = gateway.projects.add_team_member(id, 7).await.unwrap_err();

    assert!(matches!(err, GatewayError::Conflict(_)));
    assert_eq!(service.call_count(Operation::Update), 0);
    assert_eq!(service.record("project_c", id).unwrap()["team_members_c"], json!("1,4"));
}

#[tokio::test]
async fn test_create_task_coerces_ids() {
    let (service, gateway) = setup();

    let task = gateway
        .tasks
        .create(&bag(json!({ "title": "Fix bug", "projectId": "3", "assigneeId": "7" })))
        .await
        .unwrap();

    let stored = service.record("task_c", task.id).unwrap();
    assert_eq!(stored["project_id_c"], json!(3));
    assert_eq!(stored["assignee_id_c"], json!(7));
    assert_eq!(stored["status_c"], json!("todo"));
    assert_eq!(stored["priority_c"], json!("medium"));
    assert_eq!(task.project_id, Some(3));
    assert_eq!(task.priority, TaskPriority::Medium);
}

#[tokio::test]
async fn test_non_numeric_id_is_rejected_before_calling_upstream() {
    let (service, gateway) = setup();

    let err = gateway
        .tasks
        .create(&bag(json!({ "title": "Fix bug", "projectId": "apollo" })))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::InvalidArgument(msg) if msg.contains("projectId")));
    assert_eq!(service.call_count(Operation::Create), 0);
}

#[tokio::test]
async fn test_list_by_status_returns_matches_only() {
    let (service, gateway) = setup();
    for (title, status) in [("a", "todo"), ("b", "done"), ("c", "in_progress"), ("d", "done"), ("e", "todo")] {
        service.insert(
            "task_c",
            record(json!({ "Name": title, "title_c": title, "status_c": status, "project_id_c": 1 })),
        );
    }

    let done = gateway.tasks.list_by_status(&TaskStatus::Done).await;

    let titles: Vec<&str> = done.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["b", "d"]);
}

#[tokio::test]
async fn test_list_by_project_and_assignee() {
    let (service, gateway) = setup();
    service.insert("task_c", record(json!({ "title_c": "a", "project_id_c": 1, "assignee_id_c": 5 })));
    service.insert("task_c", record(json!({ "title_c": "b", "project_id_c": { "Id": 2, "Name": "B" } })));
    service.insert("task_c", record(json!({ "title_c": "c", "project_id_c": 2, "assignee_id_c": 5, "priority_c": "high" })));

    assert_eq!(gateway.tasks.list_by_project(2).await.len(), 2);
    assert_eq!(gateway.tasks.list_by_assignee(5).await.len(), 2);
    assert_eq!(gateway.tasks.list_by_priority(TaskPriority::High).await.len(), 1);
}

#[tokio::test]
async fn test_list_failures_yield_empty() {
    let (service, gateway) = setup();
    service.insert("task_c", record(json!({ "title_c": "a" })));

    service.inject(Operation::Fetch, Fault::Transport("connection reset".to_string()));
    assert!(gateway.tasks.list_all().await.is_empty());

    service.inject(Operation::Fetch, Fault::Reject(Some("rate limited".to_string())));
    assert!(gateway.tasks.list_all().await.is_empty());

    assert_eq!(gateway.tasks.list_all().await.len(), 1);
}

#[tokio::test]
async fn test_get_by_id_miss_is_not_found() {
    let (service, gateway) = setup();

    let err = gateway.tasks.get_by_id(99).await.unwrap_err();
    assert_eq!(err, GatewayError::NotFound("Record with Id 99 does not exist".to_string()));

    service.inject(Operation::Get, Fault::Reject(None));
    let err = gateway.tasks.get_by_id(99).await.unwrap_err();
    assert_eq!(err, GatewayError::NotFound("Task not found".to_string()));
}

#[tokio::test]
async fn test_get_transport_failure_is_upstream() {
    let (service, gateway) = setup();
    service.inject(Operation::Get, Fault::Transport("dns failure".to_string()));

    let err = gateway.users.get_by_id(1).await.unwrap_err();
    assert_eq!(err, GatewayError::Upstream("dns failure".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_stalled_call_times_out() {
    let service = Arc::new(InMemoryRecordService::new());
    let gateway = Gateway::new(service.clone(), CallTimeout::new(Duration::from_secs(5)));
    service.inject(Operation::Get, Fault::Stall);

    let err = gateway.projects.get_by_id(1).await.unwrap_err();
    assert_eq!(err, GatewayError::TimedOut(Duration::from_secs(5)));
}

#[tokio::test]
async fn test_mutation_failure_messages() {
    let (service, gateway) = setup();

    service.inject(Operation::Create, Fault::Reject(Some("quota exceeded".to_string())));
    let err = gateway
        .comments
        .create(&bag(json!({ "taskId": 1, "userId": 2, "content": "hi" })))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::OperationFailed("quota exceeded".to_string()));

    service.inject(Operation::Create, Fault::RejectRecord(Some("content too long".to_string())));
    let err = gateway
        .comments
        .create(&bag(json!({ "taskId": 1, "userId": 2, "content": "hi" })))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::OperationFailed("content too long".to_string()));

    service.inject(Operation::Create, Fault::RejectRecord(None));
    let err = gateway
        .comments
        .create(&bag(json!({ "taskId": 1, "userId": 2, "content": "hi" })))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::OperationFailed("Failed to create comment".to_string()));
}

#[tokio::test]
async fn test_delete() {
    let (service, gateway) = setup();
    let id = service.insert("comment_c", record(json!({ "Name": "Comment", "content_c": "x" })));

    gateway.comments.delete(id).await.unwrap();
    assert!(service.record("comment_c", id).is_none());

    let err = gateway.comments.delete(id).await.unwrap_err();
    assert!(matches!(err, GatewayError::OperationFailed(_)));
}

#[tokio::test]
async fn test_comment_update_writes_content_only() {
    let (service, gateway) = setup();
    let id = service.insert(
        "comment_c",
        record(json!({ "Name": "Comment", "task_id_c": 1, "user_id_c": 2, "content_c": "old" })),
    );

    let comment = gateway
        .comments
        .update(id, &bag(json!({ "content": "new", "taskId": 9 })))
        .await
        .unwrap();

    assert_eq!(comment.content, "new");
    assert_eq!(comment.task_id, Some(1));
    assert_eq!(gateway.comments.list_by_task(1).await.len(), 1);
}

#[tokio::test]
async fn test_projects_by_member_manager_and_status() {
    let (service, gateway) = setup();
    service.insert("project_c", record(json!({ "title_c": "a", "manager_id_c": 1, "status_c": "active", "team_members_c": "2,3" })));
    service.insert("project_c", record(json!({ "title_c": "b", "manager_id_c": 2, "status_c": "on_hold", "team_members_c": "3" })));
    service.insert("project_c", record(json!({ "title_c": "c", "manager_id_c": 1, "status_c": "archived" })));

    assert_eq!(gateway.projects.list_by_member(3).await.len(), 2);
    assert_eq!(gateway.projects.list_by_member(2).await.len(), 1);
    assert_eq!(gateway.projects.list_by_manager(1).await.len(), 2);
    assert_eq!(gateway.projects.list_by_status(&ProjectStatus::OnHold).await.len(), 1);

    let archived = gateway
        .projects
        .list_by_status(&ProjectStatus::from("archived"))
        .await;
    assert_eq!(archived[0].status.as_str(), "archived");
}

#[tokio::test]
async fn test_users_roles() {
    let (_service, gateway) = setup();

    let user = gateway
        .users
        .create(&bag(json!({ "name": "Grace", "email": "grace@example.com" })))
        .await
        .unwrap();
    assert_eq!(user.role, UserRole::Member);
    assert_eq!(
        user.avatar.as_deref(),
        Some("https://api.dicebear.com/7.x/avataaars/svg?seed=Grace")
    );

    let user = gateway.users.change_role(user.id, UserRole::Admin).await.unwrap();
    assert_eq!(user.role, UserRole::Admin);
    assert_eq!(gateway.users.list_by_role(UserRole::Admin).await.len(), 1);
    assert!(gateway.users.list_by_role(UserRole::Member).await.is_empty());
}

#[tokio::test]
async fn test_activity_recent_is_newest_first() {
    let (service, gateway) = setup();
    for (action, at) in [
        ("first", "2024-01-01T00:00:00Z"),
        ("third", "2024-01-03T00:00:00Z"),
        ("second", "2024-01-02T00:00:00Z"),
    ] {
        service.insert(
            "activity_c",
            record(json!({ "Name": action, "action_c": action, "user_id_c": 1, "entity_type_c": "task", "entity_id_c": 4, "timestamp_c": at })),
        );
    }

    let recent = gateway.activity.list_recent(2).await;
    let actions: Vec<&str> = recent.iter().map(|a| a.action.as_str()).collect();
    assert_eq!(actions, vec!["third", "second"]);

    assert_eq!(gateway.activity.list_by_entity("task", 4).await.len(), 3);
    assert!(gateway.activity.list_by_entity("project", 4).await.is_empty());
    assert_eq!(gateway.activity.list_by_user(1).await.len(), 3);
}

#[tokio::test]
async fn test_activity_create_stamps_timestamp() {
    let (service, gateway) = setup();

    let entry = gateway
        .activity
        .create(&bag(json!({ "userId": 1, "action": "created task", "entityType": "task", "entityId": "4" })))
        .await
        .unwrap();

    assert!(entry.timestamp.is_some());
    assert_eq!(entry.entity_id, Some(4));
    let stored = service.record("activity_c", entry.id).unwrap();
    assert!(stored.contains_key("timestamp_c"));
    assert_eq!(gateway.activity.get_by_id(entry.id).await.unwrap(), entry);
}

#[tokio::test]
async fn test_ping() {
    let (service, gateway) = setup();
    assert!(gateway.ping().await.is_ok());

    service.inject(Operation::Fetch, Fault::Reject(Some("bad key".to_string())));
    assert_eq!(
        gateway.ping().await.unwrap_err(),
        GatewayError::Upstream("bad key".to_string())
    );
}

/// Task endpoints
///
/// # Endpoints
///
/// - `GET /v1/tasks` - List tasks (`?status=`, `?priority=`, `?assignee_id=`, `?project_id=`)
/// - `POST /v1/tasks` - Create task
/// - `GET /v1/tasks/:id` - Get task
/// - `PUT /v1/tasks/:id` - Update task
/// - `DELETE /v1/tasks/:id` - Delete task
/// - `PUT /v1/tasks/:id/status` - Change status
/// - `PUT /v1/tasks/:id/assignee` - Reassign
///
/// Mutations append an activity entry for the caller.

use super::{field_bag, record_activity};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    sessions::CurrentSession,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use taskboard_shared::models::{Task, TaskPriority, TaskStatus};
use validator::Validate;

const ENTITY: &str = "task";

/// Task list filters
///
/// All given filters must match.
#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee_id: Option<i64>,
    pub project_id: Option<i64>,
}

/// Parsed form of `TaskQuery`
struct TaskFilter {
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    assignee_id: Option<i64>,
    project_id: Option<i64>,
}

impl TaskFilter {
    fn parse(query: TaskQuery) -> ApiResult<Self> {
        let priority = query
            .priority
            .as_deref()
            .map(str::parse::<TaskPriority>)
            .transpose()?;

        Ok(TaskFilter {
            status: query.status.map(TaskStatus::from),
            priority,
            assignee_id: query.assignee_id,
            project_id: query.project_id,
        })
    }

    fn matches(&self, task: &Task) -> bool {
        self.status.as_ref().map_or(true, |s| &task.status == s)
            && self.priority.map_or(true, |p| task.priority == p)
            && self.assignee_id.map_or(true, |id| task.assignee_id == Some(id))
            && self.project_id.map_or(true, |id| task.project_id == Some(id))
    }
}

/// Status change request
#[derive(Debug, Deserialize, Validate)]
pub struct StatusUpdateRequest {
    #[validate(length(min = 1, max = 50, message = "Status must be 1-50 characters"))]
    pub status: String,
}

/// Reassignment request
#[derive(Debug, Deserialize, Validate)]
pub struct ReassignRequest {
    #[serde(alias = "assigneeId")]
    #[validate(range(min = 1, message = "Assignee id must be positive"))]
    pub assignee_id: i64,
}

/// List tasks
///
/// The narrowest filter is pushed to the record service; the rest are
/// applied here.
///
/// # Errors
///
/// - `400 Bad Request`: Unknown priority
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let filter = TaskFilter::parse(query)?;
    let tasks = &state.gateway.tasks;

    let candidates = if let Some(project_id) = filter.project_id {
        tasks.list_by_project(project_id).await
    } else if let Some(assignee_id) = filter.assignee_id {
        tasks.list_by_assignee(assignee_id).await
    } else if let Some(status) = &filter.status {
        tasks.list_by_status(status).await
    } else if let Some(priority) = filter.priority {
        tasks.list_by_priority(priority).await
    } else {
        tasks.list_all().await
    };

    Ok(Json(
        candidates
            .into_iter()
            .filter(|task| filter.matches(task))
            .collect(),
    ))
}

/// Create task
///
/// `createdBy` defaults to the caller.
///
/// # Endpoint
///
/// ```text
/// POST /v1/tasks
/// Authorization: Bearer <session token>
///
/// {
///   "title": "Write launch notes",
///   "projectId": "4",
///   "assigneeId": 7,
///   "priority": "high",
///   "dueDate": "2025-03-01"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing title or project, non-numeric id, bad date
/// - `422 Unprocessable Entity`: Record service rejected the record
pub async fn create_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Json(body): Json<JsonValue>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let mut fields = field_bag(body)?;
    if let Some(user_id) = current.user.id {
        if fields.pick("createdBy", "created_by_c").is_none() {
            fields = fields.with("createdBy", user_id);
        }
    }

    let task = state.gateway.tasks.create(&fields).await?;

    record_activity(&state, &current, "created task", ENTITY, task.id).await;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Get task
pub async fn get_task(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Task>> {
    Ok(Json(state.gateway.tasks.get_by_id(id).await?))
}

/// Update task
///
/// Only fields present in the body are written.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i64>,
    Json(body): Json<JsonValue>,
) -> ApiResult<Json<Task>> {
    let fields = field_bag(body)?;
    let task = state.gateway.tasks.update(id, &fields).await?;

    record_activity(&state, &current, "updated task", ENTITY, task.id).await;

    Ok(Json(task))
}

/// Delete task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.gateway.tasks.delete(id).await?;

    record_activity(&state, &current, "deleted task", ENTITY, id).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Change task status
///
/// Any status value is accepted; unknown values are stored as given.
pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i64>,
    Json(req): Json<StatusUpdateRequest>,
) -> ApiResult<Json<Task>> {
    req.validate().map_err(ApiError::from)?;

    let status = TaskStatus::from(req.status.trim());
    let action = format!("moved task to {}", status);
    let task = state.gateway.tasks.update_status(id, status).await?;

    record_activity(&state, &current, &action, ENTITY, task.id).await;

    Ok(Json(task))
}

/// Reassign task
pub async fn reassign_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i64>,
    Json(req): Json<ReassignRequest>,
) -> ApiResult<Json<Task>> {
    req.validate().map_err(ApiError::from)?;

    let task = state.gateway.tasks.reassign(id, req.assignee_id).await?;

    record_activity(&state, &current, "reassigned task", ENTITY, task.id).await;

    Ok(Json(task))
}

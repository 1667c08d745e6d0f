/// Project endpoints
///
/// # Endpoints
///
/// - `GET /v1/projects` - List projects (`?status=`, `?manager_id=`, `?member_id=`)
/// - `POST /v1/projects` - Create project
/// - `GET /v1/projects/:id` - Get project
/// - `PUT /v1/projects/:id` - Update project
/// - `DELETE /v1/projects/:id` - Delete project
/// - `POST /v1/projects/:id/members/:user_id` - Add team member
/// - `DELETE /v1/projects/:id/members/:user_id` - Remove team member
/// - `GET /v1/projects/:id/tasks` - Tasks of a project
///
/// Mutations append an activity entry for the caller.

use super::{field_bag, record_activity};
use crate::{app::AppState, error::ApiResult, sessions::CurrentSession};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use taskboard_shared::models::{Project, ProjectStatus, Task};

const ENTITY: &str = "project";

/// Project list filters
///
/// All given filters must match.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    pub status: Option<String>,
    pub manager_id: Option<i64>,
    pub member_id: Option<i64>,
}

impl ProjectQuery {
    fn matches(&self, project: &Project) -> bool {
        self.status
            .as_deref()
            .map_or(true, |status| project.status.as_str() == status)
            && self
                .manager_id
                .map_or(true, |id| project.manager_id == Some(id))
            && self.member_id.map_or(true, |id| project.team_members.contains(id))
    }
}

/// List projects
///
/// The narrowest filter is pushed to the record service; the rest are
/// applied here.
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = &state.gateway.projects;

    let candidates = if let Some(manager_id) = query.manager_id {
        projects.list_by_manager(manager_id).await
    } else if let Some(status) = &query.status {
        projects.list_by_status(&ProjectStatus::from(status.as_str())).await
    } else if let Some(member_id) = query.member_id {
        projects.list_by_member(member_id).await
    } else {
        projects.list_all().await
    };

    Ok(Json(
        candidates
            .into_iter()
            .filter(|project| query.matches(project))
            .collect(),
    ))
}

/// Create project
///
/// # Endpoint
///
/// ```text
/// POST /v1/projects
/// Authorization: Bearer <session token>
///
/// {
///   "title": "Apollo",
///   "managerId": 3,
///   "status": "active",
///   "teamMembers": [3, 7]
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing title or malformed field
/// - `422 Unprocessable Entity`: Record service rejected the record
pub async fn create_project(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Json(body): Json<JsonValue>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let fields = field_bag(body)?;
    let project = state.gateway.projects.create(&fields).await?;

    record_activity(&state, &current, "created project", ENTITY, project.id).await;

    Ok((StatusCode::CREATED, Json(project)))
}

/// Get project
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.gateway.projects.get_by_id(id).await?))
}

/// Update project
///
/// Only fields present in the body are written.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i64>,
    Json(body): Json<JsonValue>,
) -> ApiResult<Json<Project>> {
    let fields = field_bag(body)?;
    let project = state.gateway.projects.update(id, &fields).await?;

    record_activity(&state, &current, "updated project", ENTITY, project.id).await;

    Ok(Json(project))
}

/// Delete project
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.gateway.projects.delete(id).await?;

    record_activity(&state, &current, "deleted project", ENTITY, id).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Add a user to the project team
///
/// Adding an existing member returns the project unchanged.
///
/// # Errors
///
/// - `404 Not Found`: Unknown project
/// - `409 Conflict`: Team changed concurrently
pub async fn add_member(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Project>> {
    let project = state.gateway.projects.add_team_member(id, user_id).await?;

    record_activity(&state, &current, "added team member", ENTITY, project.id).await;

    Ok(Json(project))
}

/// Remove a user from the project team
///
/// Removing a non-member returns the project unchanged.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Project>> {
    let project = state.gateway.projects.remove_team_member(id, user_id).await?;

    record_activity(&state, &current, "removed team member", ENTITY, project.id).await;

    Ok(Json(project))
}

/// Tasks of a project
///
/// # Errors
///
/// - `404 Not Found`: Unknown project
pub async fn project_tasks(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Task>>> {
    let project = state.gateway.projects.get_by_id(id).await?;
    Ok(Json(state.gateway.tasks.list_by_project(project.id).await))
}

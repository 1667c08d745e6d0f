/// Dashboard summary
///
/// One call that gathers what the landing page shows: task and project
/// counts by status, the caller's tasks, and recent activity.
///
/// # Endpoint
///
/// ```text
/// GET /v1/dashboard
/// Authorization: Bearer <session token>
/// ```

use crate::{app::AppState, error::ApiResult, sessions::CurrentSession};
use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use taskboard_shared::gateway::activity::DEFAULT_RECENT_LIMIT;
use taskboard_shared::models::{ActivityEntry, Task};

/// Dashboard response
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// Total number of tasks
    pub total_tasks: usize,

    /// Task count per status value
    pub tasks_by_status: BTreeMap<String, usize>,

    /// Open tasks past their due date
    pub overdue_tasks: usize,

    /// Total number of projects
    pub total_projects: usize,

    /// Project count per status value
    pub projects_by_status: BTreeMap<String, usize>,

    /// Tasks assigned to the caller
    pub my_tasks: Vec<Task>,

    /// Most recent activity, newest first
    pub recent_activity: Vec<ActivityEntry>,
}

fn count_by<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Dashboard handler
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> ApiResult<Json<DashboardResponse>> {
    let gateway = &state.gateway;
    let (tasks, projects, recent_activity) = tokio::join!(
        gateway.tasks.list_all(),
        gateway.projects.list_all(),
        gateway.activity.list_recent(DEFAULT_RECENT_LIMIT),
    );

    let my_tasks = match current.user.id {
        Some(user_id) => gateway.tasks.list_by_assignee(user_id).await,
        None => Vec::new(),
    };

    let today = Utc::now().date_naive();

    Ok(Json(DashboardResponse {
        total_tasks: tasks.len(),
        tasks_by_status: count_by(tasks.iter().map(|t| t.status.as_str())),
        overdue_tasks: tasks.iter().filter(|t| t.is_overdue(today)).count(),
        total_projects: projects.len(),
        projects_by_status: count_by(projects.iter().map(|p| p.status.as_str())),
        my_tasks,
        recent_activity,
    }))
}

/// Comment endpoints
///
/// # Endpoints
///
/// - `GET /v1/tasks/:id/comments` - Comments on a task
/// - `POST /v1/tasks/:id/comments` - Comment on a task
/// - `PUT /v1/comments/:id` - Edit comment content
/// - `DELETE /v1/comments/:id` - Delete comment

use super::{field_bag, record_activity};
use crate::{app::AppState, error::ApiResult, sessions::CurrentSession};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::Value as JsonValue;
use taskboard_shared::models::Comment;

const ENTITY: &str = "comment";

/// Comments on a task
pub async fn list_task_comments(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(state.gateway.comments.list_by_task(task_id).await))
}

/// Comment on a task
///
/// The task comes from the path; `userId` defaults to the caller.
///
/// # Endpoint
///
/// ```text
/// POST /v1/tasks/:id/comments
/// Authorization: Bearer <session token>
///
/// { "content": "Blocked on review" }
/// ```
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(task_id): Path<i64>,
    Json(body): Json<JsonValue>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let mut fields = field_bag(body)?.with("task_id_c", task_id);
    if let Some(user_id) = current.user.id {
        if fields.pick("userId", "user_id_c").is_none() {
            fields = fields.with("userId", user_id);
        }
    }

    let comment = state.gateway.comments.create(&fields).await?;

    record_activity(&state, &current, "commented on task", ENTITY, comment.id).await;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Edit comment content
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i64>,
    Json(body): Json<JsonValue>,
) -> ApiResult<Json<Comment>> {
    let fields = field_bag(body)?;
    let comment = state.gateway.comments.update(id, &fields).await?;

    record_activity(&state, &current, "edited comment", ENTITY, comment.id).await;

    Ok(Json(comment))
}

/// Delete comment
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.gateway.comments.delete(id).await?;

    record_activity(&state, &current, "deleted comment", ENTITY, id).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Activity log endpoints
///
/// The log is append-only; entries are written as a side effect of project,
/// task and comment mutations.
///
/// # Endpoints
///
/// - `GET /v1/activity` - Newest first (`?limit=`, `?user_id=`, `?entity_type=&entity_id=`)
/// - `GET /v1/activity/:id` - Single entry

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use taskboard_shared::models::ActivityEntry;
use validator::Validate;

/// Activity list filters
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ActivityQuery {
    /// Maximum number of entries
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u32>,

    pub user_id: Option<i64>,

    /// Must be given together with `entity_id`
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
}

/// List activity, newest first
///
/// # Errors
///
/// - `400 Bad Request`: Only one of `entity_type` and `entity_id` given
/// - `422 Unprocessable Entity`: Limit out of range
pub async fn list_activity(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<Vec<ActivityEntry>>> {
    query.validate().map_err(ApiError::from)?;

    let activity = &state.gateway.activity;
    let mut entries = match (query.entity_type.as_deref(), query.entity_id, query.user_id) {
        (Some(entity_type), Some(entity_id), _) => {
            activity.list_by_entity(entity_type, entity_id).await
        }
        (Some(_), None, _) | (None, Some(_), _) => {
            return Err(ApiError::BadRequest(
                "entity_type and entity_id must be given together".to_string(),
            ));
        }
        (None, None, Some(user_id)) => activity.list_by_user(user_id).await,
        (None, None, None) => match query.limit {
            Some(limit) => return Ok(Json(activity.list_recent(limit).await)),
            None => activity.list_all().await,
        },
    };

    if let Some(limit) = query.limit {
        entries.truncate(limit as usize);
    }

    Ok(Json(entries))
}

/// Get a single activity entry
pub async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ActivityEntry>> {
    Ok(Json(state.gateway.activity.get_by_id(id).await?))
}

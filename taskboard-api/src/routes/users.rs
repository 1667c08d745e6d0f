/// User administration endpoints
///
/// Every endpoint here requires the caller's stored user record to carry the
/// `admin` role; other callers get `403 Forbidden`.
///
/// # Endpoints
///
/// - `GET /v1/users` - List users (`?q=` name/email search, `?role=` or `all`)
/// - `POST /v1/users` - Create user
/// - `GET /v1/users/:id` - Get user
/// - `PUT /v1/users/:id` - Update user
/// - `DELETE /v1/users/:id` - Delete user (never one's own account)
/// - `PUT /v1/users/:id/role` - Change role

use super::{field_bag, require_admin};
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
use taskboard_shared::models::{User, UserRole};
use validator::Validate;

/// Role filter value that disables role filtering
const ALL_ROLES: &str = "all";

/// User list filters
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    /// Case-insensitive substring of name or email
    pub q: Option<String>,

    /// Role, or `all`
    pub role: Option<String>,
}

impl UserQuery {
    fn role(&self) -> ApiResult<Option<UserRole>> {
        match self.role.as_deref().map(str::trim) {
            None | Some("") | Some(ALL_ROLES) => Ok(None),
            Some(role) => Ok(Some(role.parse::<UserRole>()?)),
        }
    }
}

fn matches_search(user: &User, needle: &str) -> bool {
    user.name.to_lowercase().contains(needle) || user.email.to_lowercase().contains(needle)
}

/// Role change request
#[derive(Debug, Deserialize, Validate)]
pub struct RoleChangeRequest {
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
}

/// List users
///
/// # Errors
///
/// - `400 Bad Request`: Unknown role filter
/// - `403 Forbidden`: Caller is not an admin
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<User>>> {
    require_admin(&state, &current).await?;

    let users = match query.role()? {
        Some(role) => state.gateway.users.list_by_role(role).await,
        None => state.gateway.users.list_all().await,
    };

    let needle = query
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    Ok(Json(match needle {
        Some(needle) => users
            .into_iter()
            .filter(|user| matches_search(user, &needle))
            .collect(),
        None => users,
    }))
}

/// Create user
///
/// # Endpoint
///
/// ```text
/// POST /v1/users
/// Authorization: Bearer <session token>
///
/// { "name": "Grace", "email": "grace@example.com", "role": "project_manager" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing name, invalid email or unknown role
/// - `403 Forbidden`: Caller is not an admin
pub async fn create_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Json(body): Json<JsonValue>,
) -> ApiResult<(StatusCode, Json<User>)> {
    require_admin(&state, &current).await?;

    let fields = field_bag(body)?;
    let user = state.gateway.users.create(&fields).await?;

    tracing::info!(user_id = user.id, role = %user.role, "User created");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Get user
pub async fn get_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    require_admin(&state, &current).await?;
    Ok(Json(state.gateway.users.get_by_id(id).await?))
}

/// Update user
pub async fn update_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i64>,
    Json(body): Json<JsonValue>,
) -> ApiResult<Json<User>> {
    require_admin(&state, &current).await?;

    let fields = field_bag(body)?;
    Ok(Json(state.gateway.users.update(id, &fields).await?))
}

/// Delete user
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin, or is deleting their own account
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&state, &current).await?;
    if current.user.id == Some(id) {
        return Err(ApiError::Forbidden(
            "You cannot delete your own account".to_string(),
        ));
    }

    state.gateway.users.delete(id).await?;

    tracing::info!(user_id = id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Change a user's role
///
/// # Endpoint
///
/// ```text
/// PUT /v1/users/:id/role
/// Authorization: Bearer <session token>
///
/// { "role": "admin" }
/// ```
pub async fn change_user_role(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<i64>,
    Json(req): Json<RoleChangeRequest>,
) -> ApiResult<Json<User>> {
    require_admin(&state, &current).await?;
    req.validate().map_err(ApiError::from)?;

    let role: UserRole = req.role.parse()?;
    Ok(Json(state.gateway.users.change_role(id, role).await?))
}
